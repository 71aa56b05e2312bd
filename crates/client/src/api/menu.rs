//! Catalog endpoints: products, deals, options and option groups.

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument};

use foodpoint_core::menu::{DietaryInfo, OptionGroup, Variation};
use foodpoint_core::{
    Deal, DealId, DealStatus, MenuOption, OptionGroupId, OptionId, Price, Product, ProductId,
};

use super::client::encode;
use super::{Ack, ApiClient, ApiError};

/// Editable fields of a product, as sent to `PUT /products/{id}`.
///
/// Option groups are always sent as bare IDs; the backend rejects embedded
/// groups on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub product_name: String,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub extras: Vec<String>,
    pub variations: Vec<Variation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_info: Option<DietaryInfo>,
    pub option_groups: Vec<OptionGroupId>,
}

impl From<&Product> for ProductUpdate {
    fn from(product: &Product) -> Self {
        Self {
            product_name: product.product_name.clone(),
            price: product.price,
            description: product.description.clone(),
            category: product.category.clone(),
            image: product.image.clone(),
            extras: product
                .extras
                .iter()
                .map(|extra| extra.name().to_string())
                .collect(),
            variations: product.variations.clone(),
            dietary_info: product.dietary_info,
            option_groups: product
                .option_groups
                .iter()
                .filter_map(|group| group.id().cloned())
                .collect(),
        }
    }
}

/// A deal to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    pub deal_name: String,
    pub product_ids: Vec<ProductId>,
    pub price: Price,
}

/// A product to create through `POST /products/bulk-create`.
///
/// There is no image URL: the backend stores uploaded files and fills it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub product_name: String,
    pub price: Price,
    /// Opening stock.
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub extras: Vec<String>,
    pub variations: Vec<Variation>,
    pub dietary_info: DietaryInfo,
    pub option_groups: Vec<OptionGroupId>,
}

impl NewProduct {
    /// A product with a name, price and opening stock and nothing else.
    #[must_use]
    pub fn new(product_name: impl Into<String>, price: Price, quantity: u32) -> Self {
        Self {
            product_name: product_name.into(),
            price,
            quantity,
            description: None,
            category: None,
            extras: Vec::new(),
            variations: Vec::new(),
            dietary_info: DietaryInfo::default(),
            option_groups: Vec::new(),
        }
    }
}

/// An image uploaded alongside new products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    pub file_name: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// What the backend does with a batch of new products once saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealAction {
    /// Bundle the whole batch into a new deal with this name.
    CreateDeal(String),
    /// Only add the products to the catalog.
    CatalogOnly,
}

impl DealAction {
    const fn wire_name(&self) -> &'static str {
        match self {
            Self::CreateDeal(_) => "new",
            Self::CatalogOnly => "existing",
        }
    }
}

/// Multipart body for `POST /products/bulk-create`.
///
/// Parts: one `images` file per image, `products` as a JSON array,
/// `dealAction`, and `dealName` when a deal is created.
fn bulk_create_form(
    products: &[NewProduct],
    images: Vec<ProductImage>,
    deal: &DealAction,
) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for image in images {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        form = form.part("images", part);
    }

    form = form
        .text("products", encode(products)?.to_string())
        .text("dealAction", deal.wire_name());
    if let DealAction::CreateDeal(name) = deal {
        form = form.text("dealName", name.clone());
    }
    Ok(form)
}

impl ApiClient {
    // =========================================================================
    // Products
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body isn't a product list.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get("products").await
    }

    /// Create several products at once, optionally bundling them as a deal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if an image's content type isn't a valid MIME
    /// type, and `ApiError` if the request fails.
    #[instrument(skip(self, products, images), fields(products = products.len(), images = images.len()))]
    pub async fn create_products(
        &self,
        products: &[NewProduct],
        images: Vec<ProductImage>,
        deal: &DealAction,
    ) -> Result<Ack, ApiError> {
        let form = bulk_create_form(products, images, deal)?;
        debug!(deal_action = deal.wire_name(), "Uploading product batch");
        self.post_form("products/bulk-create", form).await
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.get(&format!("products/{id}")).await
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Ack, ApiError> {
        self.put(&format!("products/{id}"), update).await
    }

    /// Add `amount` units to a product's stock.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn restock_product(&self, id: &ProductId, amount: u32) -> Result<Ack, ApiError> {
        self.patch(&format!("products/{id}/restock"), &json!({ "amount": amount }))
            .await
    }

    // =========================================================================
    // Deals
    // =========================================================================

    /// List every deal, active or not.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body isn't a deal list.
    #[instrument(skip(self))]
    pub async fn list_deals(&self) -> Result<Vec<Deal>, ApiError> {
        self.get("deals").await
    }

    /// Create a deal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, deal), fields(deal_name = %deal.deal_name))]
    pub async fn create_deal(&self, deal: &NewDeal) -> Result<Ack, ApiError> {
        self.post("deals", deal).await
    }

    /// Delete a deal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(deal_id = %id))]
    pub async fn delete_deal(&self, id: &DealId) -> Result<Ack, ApiError> {
        self.delete(&format!("deals/{id}")).await
    }

    /// Activate or deactivate a deal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(deal_id = %id))]
    pub async fn set_deal_status(&self, id: &DealId, status: DealStatus) -> Result<Ack, ApiError> {
        self.patch(&format!("deals/{id}/status"), &json!({ "status": status }))
            .await
    }

    // =========================================================================
    // Options and option groups
    // =========================================================================

    /// List every option group.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_option_groups(&self) -> Result<Vec<OptionGroup>, ApiError> {
        self.get("option-groups").await
    }

    /// Create an option group.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, group), fields(group_name = %group.name))]
    pub async fn create_option_group(&self, group: &OptionGroup) -> Result<Ack, ApiError> {
        self.post("option-groups", group).await
    }

    /// Delete an option group.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(group_id = %id))]
    pub async fn delete_option_group(&self, id: &OptionGroupId) -> Result<Ack, ApiError> {
        self.delete(&format!("option-groups/{id}")).await
    }

    /// List every option.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_options(&self) -> Result<Vec<MenuOption>, ApiError> {
        self.get("options").await
    }

    /// Create an option.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, option), fields(option_name = %option.name))]
    pub async fn create_option(&self, option: &MenuOption) -> Result<Ack, ApiError> {
        self.post("options", option).await
    }

    /// Delete an option.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(option_id = %id))]
    pub async fn delete_option(&self, id: &OptionId) -> Result<Ack, ApiError> {
        self.delete(&format!("options/{id}")).await
    }
}
