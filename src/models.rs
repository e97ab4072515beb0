//! Request and response models shared across route families.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{Loc, ValidationErrors};
use crate::validation::{
    check_gt, coerce_datetime, coerce_email, coerce_http_url, coerce_i64, Fields, Schema,
};

// =============================================================================
// Items
// =============================================================================

/// The basic record: name, description, price and tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    #[schema(example = "Foo")]
    pub name: String,
    #[schema(example = "A very nice Item")]
    pub description: Option<String>,
    #[schema(example = 35.4)]
    pub price: f64,
    #[schema(example = 3.2)]
    pub tax: Option<f64>,
}

impl Schema for Item {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let name = f.required_str("name");
        let description = f.optional_str("description");
        let price = f.required_f64("price");
        let tax = f.optional_f64("tax");
        f.finish(|| {
            Some(Item {
                name: name?,
                description,
                price: price?,
                tax,
            })
        })
    }
}

impl Item {
    pub fn price_with_tax(&self) -> Option<f64> {
        self.tax.map(|tax| self.price + tax)
    }
}

/// An item with a set of unique tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaggedItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub tax: Option<f64>,
    #[schema(value_type = Vec<String>)]
    pub tags: BTreeSet<String>,
}

impl Schema for TaggedItem {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let name = f.required_str("name");
        let description = f.optional_str("description");
        let price = f.required_f64("price");
        let tax = f.optional_f64("tax");
        let tags = f.str_set("tags");
        f.finish(|| {
            Some(TaggedItem {
                name: name?,
                description,
                price: price?,
                tax,
                tags,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Image {
    #[schema(example = "http://example.com/baz.jpg")]
    pub url: String,
    #[schema(example = "The Foo live")]
    pub name: String,
}

impl Schema for Image {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let url = f.required("url", coerce_http_url);
        let name = f.required_str("name");
        f.finish(|| Some(Image { url: url?, name: name? }))
    }
}

/// An item with tags and nested images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub tax: Option<f64>,
    #[schema(value_type = Vec<String>)]
    pub tags: BTreeSet<String>,
    pub image: Option<Image>,
    pub images: Option<Vec<Image>>,
}

impl Schema for NestedItem {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let name = f.required_str("name");
        let description = f.optional_str("description");
        let price = f.required_f64("price");
        let tax = f.optional_f64("tax");
        let tags = f.str_set("tags");
        let image = f.optional_nested::<Image>("image");
        let images = f.optional_nested::<Vec<Image>>("images");
        f.finish(|| {
            Some(NestedItem {
                name: name?,
                description,
                price: price?,
                tax,
                tags,
                image,
                images,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Offer {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub items: Vec<NestedItem>,
}

impl Schema for Offer {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let name = f.required_str("name");
        let description = f.optional_str("description");
        let price = f.required_f64("price");
        let items = f.required_nested::<Vec<NestedItem>>("items");
        f.finish(|| {
            Some(Offer {
                name: name?,
                description,
                price: price?,
                items: items?,
            })
        })
    }
}

/// Item of the catalog used by the response-model routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub tax: Option<f64>,
    pub tags: Vec<String>,
}

impl CatalogItem {
    pub fn new(name: &str, price: f64) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            price,
            tax: None,
            tags: Vec::new(),
        }
    }
}

impl Schema for CatalogItem {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let name = f.required_str("name");
        let description = f.optional_str("description");
        let price = f.required_f64("price");
        let tax = f.optional_f64("tax");
        let tags = f.str_list("tags");
        f.finish(|| {
            Some(CatalogItem {
                name: name?,
                description,
                price: price?,
                tax,
                tags,
            })
        })
    }
}

pub const DEFAULT_TAX: f64 = 10.5;

/// Item whose every field may be omitted; used for full and partial updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdatableItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub tax: f64,
    pub tags: Vec<String>,
}

impl Default for UpdatableItem {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            price: None,
            tax: DEFAULT_TAX,
            tags: Vec::new(),
        }
    }
}

impl Schema for UpdatableItem {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let name = f.optional_str("name");
        let description = f.optional_str("description");
        let price = f.optional_f64("price");
        let tax = f.optional_f64("tax");
        let tags = f.str_list("tags");
        f.finish(|| {
            Some(UpdatableItem {
                name,
                description,
                price,
                tax: tax.unwrap_or(DEFAULT_TAX),
                tags,
            })
        })
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = "dave")]
    pub username: String,
    #[schema(example = "Dave Grohl")]
    pub full_name: Option<String>,
}

impl Schema for User {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let username = f.required_str("username");
        let full_name = f.optional_str("full_name");
        f.finish(|| {
            Some(User {
                username: username?,
                full_name,
            })
        })
    }
}

/// Incoming user, with the plaintext password.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct UserIn {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl Schema for UserIn {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let username = f.required_str("username");
        let password = f.required_str("password");
        let email = f.required("email", coerce_email);
        let full_name = f.optional_str("full_name");
        f.finish(|| {
            Some(UserIn {
                username: username?,
                password: password?,
                email: email?,
                full_name,
            })
        })
    }
}

/// Outgoing user: never carries a password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserOut {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl From<UserIn> for UserOut {
    fn from(user: UserIn) -> Self {
        Self {
            username: user.username,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

impl From<UserInDB> for UserOut {
    fn from(user: UserInDB) -> Self {
        Self {
            username: user.username,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

/// Stored user, with the hashed password only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInDB {
    pub username: String,
    pub hashed_password: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl UserInDB {
    pub fn from_user_in(user: UserIn, hasher: impl FnOnce(&str) -> String) -> Self {
        Self {
            hashed_password: hasher(&user.password),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

/// Result of decoding a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: Option<bool>,
}

// =============================================================================
// Union models
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CarItem {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlaneItem {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: i64,
}

/// Either kind of vehicle; serialized as the bare variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Vehicle {
    Plane(PlaneItem),
    Car(CarItem),
}

// =============================================================================
// Timestamped records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EncodableItem {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>,
}

impl Schema for EncodableItem {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let title = f.required_str("title");
        let timestamp = f.required("timestamp", coerce_datetime);
        let description = f.optional_str("description");
        f.finish(|| {
            Some(EncodableItem {
                title: title?,
                timestamp: timestamp?,
                description,
            })
        })
    }
}

/// Body carrying several models plus a singular value.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ItemUserImportance {
    pub item: Item,
    pub user: User,
    pub importance: i64,
}

impl Schema for ItemUserImportance {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let item = f.required_nested::<Item>("item");
        let user = f.required_nested::<User>("user");
        let importance = f.required("importance", coerce_i64);
        let importance = f.check("importance", importance, |v| check_gt(*v as f64, 0.0));
        f.finish(|| {
            Some(ItemUserImportance {
                item: item?,
                user: user?,
                importance: importance?,
            })
        })
    }
}

/// Body with a single model embedded under its name.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmbeddedItem {
    pub item: Item,
}

impl Schema for EmbeddedItem {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let item = f.required_nested::<Item>("item");
        f.finish(|| Some(EmbeddedItem { item: item? }))
    }
}
