//! Runs one quote request from start to finish.
//!
//! Each submission takes a fresh token from the shared result board, which invalidates every
//! earlier submission. The route and the suburb are resolved concurrently and each writes its own
//! part of the board, but only while its token is still current. Requests already in flight are
//! not cancelled; their results are dropped when they arrive.

use crate::api::{self, DistanceResolver, Mode};
use crate::model::{
    price_for, DeliveryDayTable, FixedPrice, FixedPriceTable, PriceQuote, Quote, RouteSummary,
    SuburbDays,
};
use crate::{Config, FixedPriceMatch, Result};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Identifies one submission. Only the most recently issued token may write to the board.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct Token(u64);

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A submission that has taken its token but not yet run. Created by `Quoter::begin`.
#[derive(Debug)]
pub struct Submission(Token);

/// The progress of one submission, for logging.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Stage {
    RouteRequested,
    RouteReady,
    RouteFailed,
    SuburbRequested,
    SuburbReady,
    SuburbFailed,
}

/// The shared output surface that every submission writes to.
#[derive(Debug, Default)]
struct Board {
    generation: u64,
    quote: Quote,
}

impl Board {
    /// Clears the board and issues a token that invalidates all earlier ones.
    fn begin(&mut self) -> Token {
        self.generation += 1;
        self.quote = Quote::default();
        Token(self.generation)
    }

    fn is_current(&self, token: Token) -> bool {
        token.0 == self.generation
    }

    /// Writes `price` unless `token` is stale. A fixed price is never replaced by a distance
    /// price.
    fn set_price(&mut self, token: Token, price: PriceQuote) -> bool {
        if !self.is_current(token) {
            return false;
        }
        let has_fixed = self.quote.price.as_ref().is_some_and(|p| p.is_fixed());
        let keep_fixed = has_fixed && !price.is_fixed();
        if !keep_fixed {
            self.quote.price = Some(price);
        }
        true
    }

    fn set_route(&mut self, token: Token, route: RouteSummary) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.quote.route = Some(route);
        true
    }

    fn set_suburb(&mut self, token: Token, suburb: SuburbDays) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.quote.suburb = Some(suburb);
        true
    }

    fn snapshot(&self, token: Token) -> Option<Quote> {
        self.is_current(token).then(|| self.quote.clone())
    }
}

/// Produces delivery quotes for customer addresses.
pub struct Quoter {
    origin: String,
    resolver: DistanceResolver,
    fixed_prices: FixedPriceTable,
    matching: FixedPriceMatch,
    days: DeliveryDayTable,
    board: Arc<Mutex<Board>>,
}

impl Quoter {
    pub(crate) fn new(
        origin: impl Into<String>,
        resolver: DistanceResolver,
        matching: FixedPriceMatch,
        days: DeliveryDayTable,
    ) -> Self {
        Self {
            origin: origin.into(),
            resolver,
            fixed_prices: FixedPriceTable::default(),
            matching,
            days,
            board: Arc::new(Mutex::new(Board::default())),
        }
    }

    /// Creates the mapping provider for `mode` and starts loading the delivery-day table in the
    /// background.
    pub async fn from_config(config: &Config, mode: Mode) -> Result<Self> {
        let maps = api::maps(config, mode).await?;
        let days = DeliveryDayTable::spawn_load(config.suburb_data(), config.request_timeout());
        Ok(Self::new(
            config.origin(),
            DistanceResolver::new(maps, config.distance_source()),
            config.fixed_price_match(),
            days,
        ))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn delivery_days(&self) -> &DeliveryDayTable {
        &self.days
    }

    /// Quotes delivery to `address`. The address is passed to the provider as typed.
    ///
    /// Returns `None` if another submission started before this one finished, in which case none
    /// of this submission's results were kept.
    pub async fn submit(&self, address: &str) -> Option<Quote> {
        let submission = self.begin().await;
        self.run(submission, address).await
    }

    /// Starts a submission, clearing the board and superseding every earlier submission.
    pub async fn begin(&self) -> Submission {
        Submission(self.board.lock().await.begin())
    }

    /// Completes `submission` for `address`. See `submit`.
    pub async fn run(&self, submission: Submission, address: &str) -> Option<Quote> {
        let Submission(token) = submission;
        debug!("Submission {token} for '{address}'");

        let fixed = match self.matching {
            FixedPriceMatch::Substring => self.fixed_prices.find(address).copied(),
            FixedPriceMatch::Locality => None,
        };
        if let Some(fixed) = fixed {
            debug!("'{address}' is in fixed-price suburb {}", fixed.suburb);
            self.write_fixed(token, fixed).await;
        }

        tokio::join!(
            self.route_part(token, address, fixed.is_some()),
            self.suburb_part(token, address)
        );

        let quote = self.board.lock().await.snapshot(token);
        if quote.is_none() {
            debug!("Submission {token} was superseded");
        }
        quote
    }

    async fn write_fixed(&self, token: Token, fixed: FixedPrice) {
        let price = PriceQuote::fixed(fixed.suburb, fixed.price);
        self.board.lock().await.set_price(token, price);
    }

    async fn is_current(&self, token: Token) -> bool {
        self.board.lock().await.is_current(token)
    }

    fn stage(&self, token: Token, stage: Stage) {
        debug!("Submission {token}: {stage:?}");
    }

    /// Requests the route and, unless a fixed price applies, prices the distance.
    async fn route_part(&self, token: Token, address: &str, fixed: bool) {
        self.stage(token, Stage::RouteRequested);
        let route = match self.resolver.route(&self.origin, address).await {
            Ok(route) => {
                self.stage(token, Stage::RouteReady);
                Some(route)
            }
            Err(e) => {
                error!("Directions request failed for '{address}': {e:#}");
                self.stage(token, Stage::RouteFailed);
                None
            }
        };

        if let Some(route) = &route {
            if !self.board.lock().await.set_route(token, route.clone()) {
                return;
            }
        }
        if fixed || !self.is_current(token).await {
            return;
        }

        let meters = match self
            .resolver
            .distance(&self.origin, address, route.as_ref())
            .await
        {
            Ok(meters) => meters,
            Err(e) => {
                error!("Unable to measure the distance to '{address}': {e:#}");
                return;
            }
        };
        match price_for(meters) {
            Ok(price) => {
                self.board.lock().await.set_price(token, price);
            }
            Err(e) => error!("Unable to price the delivery to '{address}': {e:#}"),
        }
    }

    /// Resolves the suburb and annotates the quote with its delivery days.
    async fn suburb_part(&self, token: Token, address: &str) {
        self.stage(token, Stage::SuburbRequested);
        let suburb = match self.resolver.resolve_suburb(address).await {
            Ok(suburb) => {
                self.stage(token, Stage::SuburbReady);
                suburb
            }
            Err(e) => {
                error!("Geocode was not successful for '{address}': {e:#}");
                self.stage(token, Stage::SuburbFailed);
                return;
            }
        };

        if self.matching == FixedPriceMatch::Locality {
            if let Some(fixed) = self.fixed_prices.find_locality(&suburb).copied() {
                debug!("Locality {suburb} is a fixed-price suburb");
                self.write_fixed(token, fixed).await;
            }
        }

        let lookup = self.days.lookup(&suburb);
        self.board
            .lock()
            .await
            .set_suburb(token, SuburbDays::from_lookup(suburb, lookup));
    }

    #[cfg(test)]
    async fn current(&self) -> Quote {
        self.board.lock().await.quote.clone()
    }
}
