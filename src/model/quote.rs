use crate::model::{Lookup, PriceQuote, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const NOT_AVAILABLE: &str = "Delivery information not available";

/// The suburb an address resolved to and the days it receives deliveries.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SuburbDays {
    /// The upper-cased locality, empty if the address had none.
    suburb: String,
    /// `None` when there is no delivery information for the suburb.
    days: Option<Vec<Weekday>>,
}

impl SuburbDays {
    pub fn new(suburb: impl Into<String>, days: Option<Vec<Weekday>>) -> Self {
        Self {
            suburb: suburb.into(),
            days,
        }
    }

    /// Builds the annotation for `suburb` from a delivery-day table lookup.
    pub fn from_lookup(suburb: impl Into<String>, lookup: Lookup) -> Self {
        let suburb = suburb.into();
        let days = match lookup {
            Lookup::Found(days) if !suburb.is_empty() => Some(days.available()),
            _ => None,
        };
        Self { suburb, days }
    }

    pub fn suburb(&self) -> &str {
        &self.suburb
    }

    pub fn days(&self) -> Option<&[Weekday]> {
        self.days.as_deref()
    }
}

impl Display for SuburbDays {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.suburb)?;
        match &self.days {
            None => write!(f, "{NOT_AVAILABLE}"),
            Some(days) if days.is_empty() => write!(f, "Delivery Days: none"),
            Some(days) => {
                let names: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                write!(f, "Delivery Days: {}", names.join(", "))
            }
        }
    }
}

/// A driving route from the warehouse to the customer, as shown alongside the quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub start_address: String,
    pub end_address: String,
    pub distance_meters: f64,
    pub distance_text: String,
    pub duration_text: String,
    /// The provider's name for the route, e.g. "Hume Fwy".
    pub summary: String,
    /// Encoded polyline of the whole route.
    pub polyline: String,
}

impl Display for RouteSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Distance from {} to {} is {} and will take approximately {}",
            self.start_address, self.end_address, self.distance_text, self.duration_text
        )?;
        if !self.summary.is_empty() {
            write!(f, " via {}", self.summary)?;
        }
        Ok(())
    }
}

/// The result of one quote request. Each part is filled in independently and any of them may be
/// missing if the provider failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Option<PriceQuote>,
    pub suburb: Option<SuburbDays>,
    pub route: Option<RouteSummary>,
}

impl Quote {
    /// True when neither a price nor a suburb could be determined.
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.suburb.is_none()
    }
}

impl Display for Quote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(price) = &self.price {
            write!(f, "{price}")?;
            if self.suburb.is_some() {
                write!(f, "\n\n")?;
            }
        }
        if let Some(suburb) = &self.suburb {
            write!(f, "{suburb}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{price_for, DeliveryDays};

    fn mernda() -> DeliveryDays {
        DeliveryDays::new([
            (Weekday::Monday, true),
            (Weekday::Tuesday, false),
            (Weekday::Wednesday, false),
            (Weekday::Thursday, true),
        ])
    }

    #[test]
    fn test_suburb_days_found() {
        let s = SuburbDays::from_lookup("MERNDA", Lookup::Found(mernda()));
        let text = s.to_string();
        assert_eq!(text, "MERNDA\nDelivery Days: Monday, Thursday");
        assert!(text.contains("Monday"));
        assert!(!text.contains("Tuesday"));
    }

    #[test]
    fn test_suburb_days_not_available() {
        for lookup in [Lookup::NotLoaded, Lookup::Unavailable, Lookup::Absent] {
            let s = SuburbDays::from_lookup("EPPING", lookup);
            assert_eq!(s.to_string(), "EPPING\nDelivery information not available");
        }
        let s = SuburbDays::from_lookup("", Lookup::Found(mernda()));
        assert_eq!(s.days(), None);
    }

    #[test]
    fn test_suburb_days_none_available() {
        let s = SuburbDays::from_lookup("DOREEN", Lookup::Found(DeliveryDays::default()));
        assert_eq!(s.to_string(), "DOREEN\nDelivery Days: none");
    }

    #[test]
    fn test_quote_display() {
        let quote = Quote {
            price: Some(PriceQuote::fixed("Mernda", 90)),
            suburb: Some(SuburbDays::from_lookup("MERNDA", Lookup::Found(mernda()))),
            route: None,
        };
        assert_eq!(
            quote.to_string(),
            "Calculated Delivery Price: $90 plus GST\n\nMERNDA\nDelivery Days: Monday, Thursday"
        );

        let price_only = Quote {
            price: Some(price_for(3_000.0).unwrap()),
            ..Quote::default()
        };
        assert_eq!(price_only.to_string(), "Calculated Delivery Price: $70 plus GST");

        let suburb_only = Quote {
            suburb: Some(SuburbDays::new("EPPING", None)),
            ..Quote::default()
        };
        assert_eq!(
            suburb_only.to_string(),
            "EPPING\nDelivery information not available"
        );
        assert!(Quote::default().is_empty());
    }

    #[test]
    fn test_route_summary_display() {
        let route = RouteSummary {
            start_address: "308-320 Settlement Rd, Thomastown VIC 3074".to_string(),
            end_address: "Mernda VIC 3754".to_string(),
            distance_meters: 17_400.0,
            distance_text: "17.4 km".to_string(),
            duration_text: "19 mins".to_string(),
            summary: "Plenty Rd".to_string(),
            polyline: String::new(),
        };
        assert_eq!(
            route.to_string(),
            "Distance from 308-320 Settlement Rd, Thomastown VIC 3074 to Mernda VIC 3754 is \
            17.4 km and will take approximately 19 mins via Plenty Rd"
        );
    }
}
