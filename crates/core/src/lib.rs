//! FoodPoint Core - Shared types library.
//!
//! This crate provides the domain types used across all FoodPoint components:
//! - `client` - Session store, cart store, REST client and menu refresher
//! - `cli` - Command-line front end for cashiers and superadmins
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, roles, and statuses
//! - [`cart`] - The shopping cart model and its total invariant
//! - [`menu`] - Product, deal, and option schemas plus the merged menu view
//! - [`order`] - Order schemas and the checkout payload

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod menu;
pub mod order;
pub mod types;

pub use cart::{Cart, CartError, CartItem, CartItemId, ItemKind, NewCartItem};
pub use menu::{Deal, MenuItem, MenuOption, OptionGroup, Product};
pub use order::{NewOrder, Order, OrderItem, OrderStats};
pub use types::*;
