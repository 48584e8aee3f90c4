//! Suburbs that are delivered to at a flat price regardless of the driving distance.

use serde::Serialize;

/// A suburb with a flat delivery price.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct FixedPrice {
    pub suburb: &'static str,
    pub price: u32,
}

/// The fixed-price suburbs, in match order.
const FIXED_PRICES: &[FixedPrice] = &[
    FixedPrice {
        suburb: "Craigieburn",
        price: 90,
    },
    FixedPrice {
        suburb: "Roxburgh Park",
        price: 90,
    },
    FixedPrice {
        suburb: "Mernda",
        price: 90,
    },
    FixedPrice {
        suburb: "Doreen",
        price: 90,
    },
];

/// Looks up flat delivery prices. The entries are compiled into the program and never change.
#[derive(Debug, Clone, Copy)]
pub struct FixedPriceTable {
    entries: &'static [FixedPrice],
}

impl Default for FixedPriceTable {
    fn default() -> Self {
        Self {
            entries: FIXED_PRICES,
        }
    }
}

impl FixedPriceTable {
    #[cfg(test)]
    pub(crate) fn new(entries: &'static [FixedPrice]) -> Self {
        Self { entries }
    }

    /// Returns the first entry whose suburb name appears anywhere in `address`. The match is
    /// case-sensitive and the address is not normalized, so "Mernda Court, Epping" matches
    /// "Mernda".
    pub fn find(&self, address: &str) -> Option<&FixedPrice> {
        self.entries.iter().find(|e| address.contains(e.suburb))
    }

    /// Returns the entry whose suburb name equals the geocoded `locality`, ignoring case.
    pub fn find_locality(&self, locality: &str) -> Option<&FixedPrice> {
        let locality = locality.trim();
        self.entries
            .iter()
            .find(|e| e.suburb.eq_ignore_ascii_case(locality))
    }

    pub fn entries(&self) -> &[FixedPrice] {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_substring() {
        let table = FixedPriceTable::default();
        let found = table.find("123 Example St, Craigieburn VIC").unwrap();
        assert_eq!(found.suburb, "Craigieburn");
        assert_eq!(found.price, 90);
        assert_eq!(
            table.find("1 Main Rd, Roxburgh Park VIC 3064").unwrap().suburb,
            "Roxburgh Park"
        );
        assert!(table.find("1 Main Rd, Reservoir VIC 3073").is_none());
    }

    #[test]
    fn test_find_is_case_sensitive() {
        let table = FixedPriceTable::default();
        assert!(table.find("123 Example St, CRAIGIEBURN VIC").is_none());
        assert!(table.find("123 example st, craigieburn").is_none());
    }

    #[test]
    fn test_find_substring_false_positive() {
        let table = FixedPriceTable::default();
        assert_eq!(
            table.find("4 Mernda Court, Epping VIC").unwrap().suburb,
            "Mernda"
        );
        assert!(table.find_locality("Epping").is_none());
    }

    #[test]
    fn test_first_entry_wins() {
        const ENTRIES: &[FixedPrice] = &[
            FixedPrice {
                suburb: "Park",
                price: 50,
            },
            FixedPrice {
                suburb: "Roxburgh Park",
                price: 90,
            },
        ];
        let table = FixedPriceTable::new(ENTRIES);
        assert_eq!(table.find("Roxburgh Park VIC").unwrap().price, 50);
        assert_eq!(table.find_locality("roxburgh park").unwrap().price, 90);
    }

    #[test]
    fn test_find_locality() {
        let table = FixedPriceTable::default();
        assert_eq!(table.find_locality("DOREEN").unwrap().suburb, "Doreen");
        assert_eq!(table.find_locality(" Mernda ").unwrap().suburb, "Mernda");
        assert!(table.find_locality("Mernda Village").is_none());
        assert!(table.find_locality("").is_none());
    }
}
