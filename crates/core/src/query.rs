//! Backend-neutral description of a listing page request.
//!
//! [`ListingQuery::for_filters`] turns a [`FilterState`] and a page number
//! into an offset range plus the predicates the remote data service must
//! apply. The web crate encodes the result into the service's URL syntax.

use rust_decimal::Decimal;

use crate::types::FilterState;

/// Listings per page.
pub const PAGE_SIZE: u32 = 10;

/// Maximum price treated as "no upper bound".
pub const PRICE_CEILING: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Inclusive offset range `[from, to]` for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub from: u32,
    pub to: u32,
}

impl PageRange {
    /// Range for a zero-based page: `[page * N, (page + 1) * N - 1]`.
    #[must_use]
    pub const fn for_page(page: u32) -> Self {
        let from = page.saturating_mul(PAGE_SIZE);
        Self {
            from,
            to: from.saturating_add(PAGE_SIZE - 1),
        }
    }

    /// Number of rows covered by the range.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.to - self.from + 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Comparison the remote service applies to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gte,
    Lte,
    Eq,
    /// Case-insensitive pattern match with `%` wildcards.
    ILike,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Eq => "eq",
            Self::ILike => "ilike",
        }
    }
}

/// A single server-side filter on the `rentals` relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    PriceAtLeast(Decimal),
    PriceAtMost(Decimal),
    BedroomsAtLeast(u32),
    BathroomsAtLeast(u32),
    ParkingRequired,
    /// City contains the text, ignoring case.
    CityContains(String),
}

impl Predicate {
    /// Column on the `rentals` relation.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::PriceAtLeast(_) | Self::PriceAtMost(_) => "price",
            Self::BedroomsAtLeast(_) => "bedrooms",
            Self::BathroomsAtLeast(_) => "bathrooms",
            Self::ParkingRequired => "parking",
            Self::CityContains(_) => "city",
        }
    }

    #[must_use]
    pub const fn operator(&self) -> Operator {
        match self {
            Self::PriceAtLeast(_) | Self::BedroomsAtLeast(_) | Self::BathroomsAtLeast(_) => {
                Operator::Gte
            }
            Self::PriceAtMost(_) => Operator::Lte,
            Self::ParkingRequired => Operator::Eq,
            Self::CityContains(_) => Operator::ILike,
        }
    }

    /// Right-hand side as the service expects it in text form.
    #[must_use]
    pub fn operand(&self) -> String {
        match self {
            Self::PriceAtLeast(price) | Self::PriceAtMost(price) => price.normalize().to_string(),
            Self::BedroomsAtLeast(n) | Self::BathroomsAtLeast(n) => n.to_string(),
            Self::ParkingRequired => "true".to_string(),
            Self::CityContains(text) => format!("%{text}%"),
        }
    }
}

/// One page request against the `rentals` relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub page: u32,
    pub range: PageRange,
    pub predicates: Vec<Predicate>,
}

impl ListingQuery {
    /// Build the request for `page` under `filters`.
    ///
    /// Zero values and the price ceiling are open-ended and add no predicate.
    /// `radius` never becomes a predicate.
    #[must_use]
    pub fn for_filters(filters: &FilterState, page: u32) -> Self {
        let mut predicates = Vec::new();

        if filters.min_price > Decimal::ZERO {
            predicates.push(Predicate::PriceAtLeast(filters.min_price));
        }
        if filters.max_price < PRICE_CEILING {
            predicates.push(Predicate::PriceAtMost(filters.max_price));
        }
        if filters.beds > 0 {
            predicates.push(Predicate::BedroomsAtLeast(filters.beds));
        }
        if filters.baths > 0 {
            predicates.push(Predicate::BathroomsAtLeast(filters.baths));
        }
        if filters.parking_only {
            predicates.push(Predicate::ParkingRequired);
        }
        if let Some(location) = filters.location_query() {
            predicates.push(Predicate::CityContains(location.to_owned()));
        }

        Self {
            page,
            range: PageRange::for_page(page),
            predicates,
        }
    }

    /// Whether any predicate targets `column`.
    #[must_use]
    pub fn constrains(&self, column: &str) -> bool {
        self.predicates.iter().any(|p| p.column() == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn austin() -> FilterState {
        FilterState {
            min_price: Decimal::ZERO,
            max_price: Decimal::from(3000),
            beds: 1,
            baths: 0,
            parking_only: false,
            location: "Austin".to_string(),
            radius: 10,
        }
    }

    #[test]
    fn test_austin_scenario_predicates() {
        let query = ListingQuery::for_filters(&austin(), 0);

        assert_eq!(query.range, PageRange { from: 0, to: 9 });
        assert_eq!(
            query.predicates,
            vec![
                Predicate::PriceAtMost(Decimal::from(3000)),
                Predicate::BedroomsAtLeast(1),
                Predicate::CityContains("Austin".to_string()),
            ]
        );
        assert!(!query.constrains("bathrooms"));
        assert!(
            !query
                .predicates
                .iter()
                .any(|p| matches!(p, Predicate::PriceAtLeast(_)))
        );
    }

    #[test]
    fn test_open_ended_price_sentinels() {
        let filters = FilterState {
            min_price: Decimal::ZERO,
            max_price: PRICE_CEILING,
            ..austin()
        };
        let query = ListingQuery::for_filters(&filters, 0);
        assert!(!query.constrains("price"));

        let filters = FilterState {
            min_price: Decimal::from(800),
            max_price: Decimal::from(9_999),
            ..austin()
        };
        let query = ListingQuery::for_filters(&filters, 0);
        assert!(query.predicates.contains(&Predicate::PriceAtLeast(Decimal::from(800))));
        assert!(query.predicates.contains(&Predicate::PriceAtMost(Decimal::from(9_999))));
    }

    #[test]
    fn test_parking_and_baths() {
        let filters = FilterState {
            baths: 2,
            parking_only: true,
            location: String::new(),
            ..austin()
        };
        let query = ListingQuery::for_filters(&filters, 0);
        assert!(query.predicates.contains(&Predicate::BathroomsAtLeast(2)));
        assert!(query.predicates.contains(&Predicate::ParkingRequired));
        assert!(!query.constrains("city"));
    }

    #[test]
    fn test_radius_is_never_a_predicate() {
        let wide = FilterState {
            radius: 50,
            ..austin()
        };
        assert_eq!(
            ListingQuery::for_filters(&wide, 0).predicates,
            ListingQuery::for_filters(&austin(), 0).predicates
        );
    }

    #[test]
    fn test_page_ranges() {
        assert_eq!(PageRange::for_page(0), PageRange { from: 0, to: 9 });
        assert_eq!(PageRange::for_page(3), PageRange { from: 30, to: 39 });
        assert_eq!(PageRange::for_page(3).len(), PAGE_SIZE);
    }

    #[test]
    fn test_operands() {
        assert_eq!(Predicate::PriceAtMost(Decimal::new(300_000, 2)).operand(), "3000");
        assert_eq!(Predicate::CityContains("Austin".to_string()).operand(), "%Austin%");
        assert_eq!(Predicate::ParkingRequired.operator().as_str(), "eq");
    }
}
