//! Shop filter state and the product pipelines built on it.
//!
//! Every surface recomputes from the full product list on each call; the
//! catalog is small and static so nothing is cached.

use crate::types::{Product, ProductType};
use std::cmp::Reverse;
use std::collections::HashSet;

pub const SECTION_SIZE: usize = 18;
pub const HOME_SECTION_SIZE: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Id(String),
}

impl CategoryFilter {
    /// `"all"` selects everything; any other value is a category id.
    pub fn from_value(value: &str) -> Self {
        match value {
            "all" => CategoryFilter::All,
            id => CategoryFilter::Id(id.to_string()),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Id(id) => id,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Id(id) => product.category == *id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Popular,
    PriceAsc,
    PriceDesc,
    New,
}

impl SortOrder {
    /// Parse a sort select value. Unknown values sort by popularity.
    pub fn from_value(value: &str) -> Self {
        match value {
            "price-asc" => SortOrder::PriceAsc,
            "price-desc" => SortOrder::PriceDesc,
            "new" => SortOrder::New,
            _ => SortOrder::Popular,
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            SortOrder::Popular => "popular",
            SortOrder::PriceAsc => "price-asc",
            SortOrder::PriceDesc => "price-desc",
            SortOrder::New => "new",
        }
    }

    /// Stable sort in this order.
    pub fn sort(self, products: &mut [&Product]) {
        match self {
            SortOrder::PriceAsc => products.sort_by_key(|p| p.price),
            SortOrder::PriceDesc => products.sort_by_key(|p| Reverse(p.price)),
            SortOrder::New => products.sort_by_key(|p| Reverse(p.added_at)),
            SortOrder::Popular => products.sort_by_key(|p| Reverse(p.popularity)),
        }
    }
}

/// Filter and sort state owned by the shop page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopState {
    pub category: CategoryFilter,
    pub query: String,
    pub sort: SortOrder,
    pub only_preorder: bool,
}

impl ShopState {
    fn matches_query(&self, product: &Product) -> bool {
        self.query.is_empty() || product.searchable_text().contains(&self.query.to_lowercase())
    }
}

/// The main grid: preorder, category and query filters, then the sort order.
pub fn filter_sorted<'a>(products: &'a [Product], state: &ShopState) -> Vec<&'a Product> {
    let mut list: Vec<&Product> = products
        .iter()
        .filter(|p| !state.only_preorder || p.preorder)
        .filter(|p| state.category.matches(p))
        .filter(|p| state.matches_query(p))
        .collect();
    state.sort.sort(&mut list);
    list
}

fn top_by<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    order: SortOrder,
    n: usize,
) -> Vec<&'a Product> {
    let mut list: Vec<&Product> = products.into_iter().collect();
    order.sort(&mut list);
    list.truncate(n);
    list
}

pub fn top_popular(products: &[Product], n: usize) -> Vec<&Product> {
    top_by(products, SortOrder::Popular, n)
}

pub fn top_new(products: &[Product], n: usize) -> Vec<&Product> {
    top_by(products, SortOrder::New, n)
}

/// Recommended products in catalog order.
pub fn top_recommended(products: &[Product], n: usize) -> Vec<&Product> {
    products.iter().filter(|p| p.recommended).take(n).collect()
}

#[derive(Debug, PartialEq)]
pub struct HomeSections<'a> {
    pub popular: Vec<&'a Product>,
    pub new: Vec<&'a Product>,
}

/// Category and query scoped sections. Sort and preorder do not apply here.
pub fn home_sections<'a>(products: &'a [Product], state: &ShopState, n: usize) -> HomeSections<'a> {
    let pool: Vec<&Product> = products
        .iter()
        .filter(|p| state.category.matches(p))
        .filter(|p| state.matches_query(p))
        .collect();
    HomeSections {
        popular: top_by(pool.iter().copied(), SortOrder::Popular, n),
        new: top_by(pool, SortOrder::New, n),
    }
}

/// The two hero tiles: the first two recommended products, or the first two
/// products when fewer than two are recommended.
pub fn hero_picks(products: &[Product]) -> Vec<&Product> {
    let picks = top_recommended(products, 2);
    if picks.len() >= 2 {
        picks
    } else {
        products.iter().take(2).collect()
    }
}

/// Recommended, then subscriptions, then everything by popularity, without
/// repeats. Falls back to the whole catalog when that comes out empty.
pub fn promo_rotation(products: &[Product]) -> Vec<&Product> {
    let recommended = products.iter().filter(|p| p.recommended);
    let subscriptions = products
        .iter()
        .filter(|p| p.kind == ProductType::Subscription);
    let popular = top_popular(products, products.len());

    let mut seen = HashSet::new();
    let rotation: Vec<&Product> = recommended
        .chain(subscriptions)
        .chain(popular)
        .filter(|p| seen.insert(p.id.as_str()))
        .collect();
    if rotation.is_empty() {
        products.iter().collect()
    } else {
        rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::product;
    use rust_decimal::Decimal;

    fn ids(list: &[&Product]) -> Vec<String> {
        list.iter().map(|p| p.id.clone()).collect()
    }

    fn catalog() -> Vec<Product> {
        let mut a = product("a", "subs");
        a.kind = ProductType::Subscription;
        a.price = Decimal::from(300);
        a.popularity = 10;
        a.added_at = 1;
        a.title = "Журнал Подписка".into();

        let mut b = product("b", "digital");
        b.price = Decimal::from(100);
        b.popularity = 50;
        b.added_at = 3;
        b.preorder = true;
        b.recommended = true;

        let mut c = product("c", "digital");
        c.price = Decimal::from(200);
        c.popularity = 50;
        c.added_at = 2;
        c.description = "Шрифт для ЗАГОЛОВКОВ".into();

        let mut d = product("d", "services");
        d.kind = ProductType::Service;
        d.price = Decimal::from(100);
        d.recommended = true;
        vec![a, b, c, d]
    }

    #[test]
    fn default_state_sorts_by_popularity_stably() {
        let products = catalog();
        let list = filter_sorted(&products, &ShopState::default());
        assert_eq!(ids(&list), ["b", "c", "a", "d"]);
    }

    #[test]
    fn price_and_recency_orders() {
        let products = catalog();
        let mut state = ShopState {
            sort: SortOrder::PriceAsc,
            ..ShopState::default()
        };
        assert_eq!(ids(&filter_sorted(&products, &state)), ["b", "d", "c", "a"]);
        state.sort = SortOrder::PriceDesc;
        assert_eq!(ids(&filter_sorted(&products, &state)), ["a", "c", "b", "d"]);
        state.sort = SortOrder::New;
        assert_eq!(ids(&filter_sorted(&products, &state)), ["b", "c", "a", "d"]);
    }

    #[test]
    fn preorder_filter_is_a_subset() {
        let products = catalog();
        let all = filter_sorted(&products, &ShopState::default());
        let state = ShopState {
            only_preorder: true,
            ..ShopState::default()
        };
        let pre = filter_sorted(&products, &state);
        assert_eq!(ids(&pre), ["b"]);
        assert!(pre.iter().all(|p| all.contains(p)));
    }

    #[test]
    fn category_filter_keeps_only_that_category() {
        let products = catalog();
        let state = ShopState {
            category: CategoryFilter::from_value("digital"),
            ..ShopState::default()
        };
        let list = filter_sorted(&products, &state);
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|p| p.category == "digital"));
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let products = catalog();
        let mut state = ShopState {
            query: "заголовков".into(),
            ..ShopState::default()
        };
        assert_eq!(ids(&filter_sorted(&products, &state)), ["c"]);
        state.query = "ПОДПИСКА".into();
        assert_eq!(ids(&filter_sorted(&products, &state)), ["a"]);
        state.query = "short d".into();
        assert_eq!(ids(&filter_sorted(&products, &state)), ["d"]);
    }

    #[test]
    fn top_surfaces() {
        let products = catalog();
        assert_eq!(ids(&top_popular(&products, 2)), ["b", "c"]);
        assert_eq!(ids(&top_new(&products, 1)), ["b"]);
        assert_eq!(ids(&top_recommended(&products, 18)), ["b", "d"]);
    }

    #[test]
    fn home_sections_ignore_sort_and_preorder() {
        let products = catalog();
        let state = ShopState {
            category: CategoryFilter::Id("digital".into()),
            sort: SortOrder::PriceDesc,
            only_preorder: true,
            ..ShopState::default()
        };
        let sections = home_sections(&products, &state, HOME_SECTION_SIZE);
        assert_eq!(ids(&sections.popular), ["b", "c"]);
        assert_eq!(ids(&sections.new), ["b", "c"]);
    }

    #[test]
    fn hero_picks_fall_back_to_catalog_order() {
        let mut products = catalog();
        assert_eq!(ids(&hero_picks(&products)), ["b", "d"]);
        products[3].recommended = false;
        assert_eq!(ids(&hero_picks(&products)), ["a", "b"]);
    }

    #[test]
    fn promo_rotation_is_a_deduplicated_union() {
        let products = catalog();
        let rotation = promo_rotation(&products);
        assert_eq!(ids(&rotation), ["b", "d", "a", "c"]);
        let unique: HashSet<_> = rotation.iter().map(|p| &p.id).collect();
        assert_eq!(unique.len(), rotation.len());
    }

    #[test]
    fn promo_rotation_of_empty_catalog_is_empty() {
        assert!(promo_rotation(&[]).is_empty());
    }

    #[test]
    fn sort_values_round_trip() {
        for order in [SortOrder::Popular, SortOrder::PriceAsc, SortOrder::PriceDesc, SortOrder::New] {
            assert_eq!(SortOrder::from_value(order.value()), order);
        }
        assert_eq!(SortOrder::from_value("cheapest"), SortOrder::Popular);
        assert_eq!(CategoryFilter::from_value("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_value("subs").value(), "subs");
    }
}
