//! Menu catalog schemas: products, deals, options and option groups.
//!
//! These mirror the backend's JSON documents (`_id`, camelCase fields) and
//! are parsed strictly at the boundary. Fields the backend may omit carry
//! `#[serde(default)]`; fields every document has are required, so a
//! payload that is missing them fails to parse instead of leaking blanks
//! into the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{CartItemId, ItemKind, NewCartItem};
use crate::types::{DealId, DealStatus, OptionGroupId, OptionId, Price, ProductId};

/// Category shown for every deal in the merged menu.
pub const DEALS_CATEGORY: &str = "Deals";

/// Dietary flags shown as badges on menu cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryInfo {
    #[serde(default, rename = "is18Plus")]
    pub is_18_plus: bool,
    #[serde(default)]
    pub is_spicy: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_vegetarian: bool,
}

/// A free-text extra attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraItem {
    Named { name: String },
    Plain(String),
}

impl ExtraItem {
    /// Display name of the extra.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named { name } | Self::Plain(name) => name,
        }
    }
}

/// A size variation with its own delivery and collection prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub size: String,
    pub delivery_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_price: Option<Price>,
}

/// A selectable add-on (e.g. "Extra cheese").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuOption {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OptionId>,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub linked_product_names: Vec<String>,
}

/// An option referenced by ID or embedded in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionRef {
    Id(OptionId),
    Embedded(MenuOption),
}

/// A named group of options attached to products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroup {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OptionGroupId>,
    pub name: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_limit: Option<u32>,
    #[serde(default)]
    pub options: Vec<OptionRef>,
    #[serde(default)]
    pub linked_product_names: Vec<String>,
}

impl OptionGroup {
    /// Index letter used to section group listings alphabetically.
    #[must_use]
    pub fn index_letter(&self) -> char {
        self.name
            .chars()
            .next()
            .map_or('#', |c| c.to_ascii_uppercase())
    }
}

/// An option group referenced by ID or embedded in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionGroupRef {
    Id(OptionGroupId),
    Embedded(Box<OptionGroup>),
}

impl OptionGroupRef {
    /// The referenced group's ID, if known.
    #[must_use]
    pub fn id(&self) -> Option<&OptionGroupId> {
        match self {
            Self::Id(id) => Some(id),
            Self::Embedded(group) => group.id.as_ref(),
        }
    }
}

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub product_name: String,
    pub price: Price,
    /// Units in stock.
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub extras: Vec<ExtraItem>,
    #[serde(default)]
    pub variations: Vec<Variation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_info: Option<DietaryInfo>,
    #[serde(default)]
    pub option_groups: Vec<OptionGroupRef>,
}

/// Products bundled in a deal, either as IDs or populated documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DealProduct {
    Id(ProductId),
    Populated(Box<Product>),
}

impl DealProduct {
    /// ID of the bundled product.
    #[must_use]
    pub fn id(&self) -> &ProductId {
        match self {
            Self::Id(id) => id,
            Self::Populated(product) => &product.id,
        }
    }
}

/// A bundled, discounted grouping of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    #[serde(rename = "_id")]
    pub id: DealId,
    pub deal_name: String,
    #[serde(default)]
    pub product_ids: Vec<DealProduct>,
    #[serde(default)]
    pub status: DealStatus,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_info: Option<DietaryInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A product or deal as shown on the customer menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: CartItemId,
    pub kind: ItemKind,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub dietary_info: DietaryInfo,
}

impl MenuItem {
    /// Build the cart line offered when this item's "add" button is pressed.
    #[must_use]
    pub fn to_cart_item(&self) -> NewCartItem {
        let base = match self.kind {
            ItemKind::Product => NewCartItem::product(self.id.as_str(), &self.name, self.price),
            ItemKind::Deal => NewCartItem::deal(self.id.as_str(), &self.name, self.price),
        };
        match &self.image {
            Some(image) => base.with_image(image),
            None => base,
        }
    }

    /// Case-insensitive name match used by menu search boxes.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

impl From<&Product> for MenuItem {
    fn from(product: &Product) -> Self {
        Self {
            id: CartItemId::new(product.id.as_str()),
            kind: ItemKind::Product,
            name: product.product_name.clone(),
            price: product.price,
            image: product.image.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            dietary_info: product.dietary_info.unwrap_or_default(),
        }
    }
}

impl From<&Deal> for MenuItem {
    fn from(deal: &Deal) -> Self {
        Self {
            id: CartItemId::new(deal.id.as_str()),
            kind: ItemKind::Deal,
            name: deal.deal_name.clone(),
            price: deal.price,
            image: deal.image.clone(),
            description: deal.description.clone(),
            category: Some(DEALS_CATEGORY.to_owned()),
            dietary_info: deal.dietary_info.unwrap_or_default(),
        }
    }
}

/// Merge deals and products into the customer menu, deals first.
///
/// Only active deals are offered; the superadmin deal gallery works from
/// the unfiltered deal list.
#[must_use]
pub fn merge_menu(deals: &[Deal], products: &[Product]) -> Vec<MenuItem> {
    deals
        .iter()
        .filter(|deal| deal.status.is_active())
        .map(MenuItem::from)
        .chain(products.iter().map(MenuItem::from))
        .collect()
}

/// Distinct, sorted product categories including the built-in defaults.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    const DEFAULT_CATEGORIES: [&str; 6] = [
        "Starters",
        "Italian",
        "Fast Food",
        "Chinese",
        "Desi",
        "Desserts",
    ];

    let mut all: Vec<String> = DEFAULT_CATEGORIES
        .iter()
        .map(|c| (*c).to_owned())
        .chain(
            products
                .iter()
                .filter_map(|p| p.category.as_deref())
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
        )
        .collect();
    all.sort();
    all.dedup();
    all
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json() -> serde_json::Value {
        serde_json::json!({
            "_id": "p1",
            "productName": "Fish Butty",
            "price": 6.6,
            "quantity": 12,
            "category": "Fast Food",
            "extras": [{"name": "Ketchup"}, "Vinegar"],
            "variations": [{"size": "Med", "deliveryPrice": 7.1}],
            "dietaryInfo": {"isSpicy": true, "is18Plus": false},
            "optionGroups": ["g1", {"_id": "g2", "name": "Sauces", "options": ["o1"]}]
        })
    }

    #[test]
    fn test_parse_product() {
        let product: Product = serde_json::from_value(product_json()).unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.quantity, 12);
        assert_eq!(product.extras[1].name(), "Vinegar");
        assert!(product.dietary_info.unwrap().is_spicy);
        assert_eq!(product.option_groups.len(), 2);
        assert_eq!(product.option_groups[1].id().unwrap().as_str(), "g2");
    }

    #[test]
    fn test_product_missing_name_is_rejected() {
        let mut json = product_json();
        json.as_object_mut().unwrap().remove("productName");
        assert!(serde_json::from_value::<Product>(json).is_err());
    }

    #[test]
    fn test_parse_deal_with_populated_products() {
        let deal: Deal = serde_json::from_value(serde_json::json!({
            "_id": "d1",
            "dealName": "Family Feast",
            "price": 19.99,
            "status": "inactive",
            "productIds": ["p1", product_json()],
            "createdAt": "2025-01-05T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(deal.status, DealStatus::Inactive);
        assert_eq!(deal.product_ids.len(), 2);
        assert_eq!(deal.product_ids[1].id().as_str(), "p1");
        assert!(deal.created_at.is_some());
    }

    #[test]
    fn test_merge_menu_puts_deals_first() {
        let product: Product = serde_json::from_value(product_json()).unwrap();
        let deal: Deal = serde_json::from_value(serde_json::json!({
            "_id": "d1", "dealName": "Family Feast", "price": 19.99
        }))
        .unwrap();

        let items = merge_menu(&[deal], &[product]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, ItemKind::Deal);
        assert_eq!(items[0].category.as_deref(), Some(DEALS_CATEGORY));
        assert_eq!(items[0].dietary_info, DietaryInfo::default());
        assert_eq!(items[1].name, "Fish Butty");
    }

    #[test]
    fn test_merge_menu_hides_inactive_deals() {
        let deal = |id: &str, status: &str| -> Deal {
            serde_json::from_value(serde_json::json!({
                "_id": id, "dealName": id, "price": 9.5, "status": status
            }))
            .unwrap()
        };
        let product: Product = serde_json::from_value(product_json()).unwrap();

        let items = merge_menu(&[deal("retired", "inactive"), deal("lunch", "active")], &[product]);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.as_str(), "lunch");
        assert!(items.iter().all(|item| item.id.as_str() != "retired"));

        let only_retired = merge_menu(&[deal("retired", "inactive")], &[]);
        assert!(only_retired.is_empty());
    }

    #[test]
    fn test_menu_item_to_cart_item() {
        let deal: Deal = serde_json::from_value(serde_json::json!({
            "_id": "d1", "dealName": "Family Feast", "price": 19.99, "image": "/d1.png"
        }))
        .unwrap();

        let line = MenuItem::from(&deal).to_cart_item();
        assert_eq!(line.kind, ItemKind::Deal);
        assert_eq!(line.deal_id.unwrap().as_str(), "d1");
        assert_eq!(line.image.as_deref(), Some("/d1.png"));
    }

    #[test]
    fn test_categories_merge_defaults() {
        let mut other: Product = serde_json::from_value(product_json()).unwrap();
        other.category = Some("  Burgers ".to_owned());
        let plain: Product = serde_json::from_value(product_json()).unwrap();

        let cats = categories(&[other, plain]);
        assert!(cats.contains(&"Burgers".to_owned()));
        assert_eq!(cats.iter().filter(|c| *c == "Fast Food").count(), 1);
        assert!(cats.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_option_group_index_letter() {
        let group: OptionGroup =
            serde_json::from_value(serde_json::json!({"_id": "g1", "name": "sauces"})).unwrap();
        assert_eq!(group.index_letter(), 'S');
        assert!(!group.is_required);
    }
}
