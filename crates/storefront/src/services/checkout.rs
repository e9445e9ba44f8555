//! Checkout orchestration.
//!
//! Loads the visitor's [`CheckoutSession`] from tenant storage, performs the
//! remote calls a step needs (saving addresses, re-pricing the cart for a
//! location, removing lines, placing the order), feeds the results to the
//! gate and writes the session back.

use chrono::Utc;
use orchard_core::{Address, AddressDraft, AddressId, AddressType, FulfillmentMethod, StorageKey};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use crate::api::{ApiClient, ApiError, Cart, PlacedOrder, ShippingMethod, Store};
use crate::checkout::{
    BillingChoice, CheckoutError, CheckoutSession, CheckoutUser, DeliveryPreferences,
    OrderPayload, PaymentMethod, PickupDetails, RecipientDetails, ShippingOutcome, Step, line_ids,
    non_deliverable_lines,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::TenantStorage;

/// How the shopper picked a shipping address.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ShippingSelection {
    /// One of the shopper's saved addresses, as listed.
    Saved { address: Address },
    /// A newly entered address, optionally saved to the account.
    New {
        address: AddressDraft,
        #[serde(default)]
        save: bool,
    },
    /// A saved address edited in place.
    Edited { id: AddressId, address: AddressDraft },
}

/// How the shopper picked a billing address.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum BillingSelection {
    SameAsShipping,
    Saved {
        address: Address,
    },
    New {
        address: AddressDraft,
        #[serde(default)]
        save: bool,
    },
}

/// Checkout service.
pub struct CheckoutService<'a> {
    api: &'a ApiClient,
    storage: &'a TenantStorage,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, storage: &'a TenantStorage) -> Self {
        Self { api, storage }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Start (or restart) checkout for a cart.
    ///
    /// A known shopper or guest completes the account step immediately. An
    /// open checkout for the same cart is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self))]
    pub async fn start(&self, cart_id: &str) -> Result<CheckoutSession> {
        if let Some(existing) = self.storage.checkout().await?
            && existing.cart_id() == cart_id
            && existing.order().is_none()
        {
            return Ok(existing);
        }

        let mut checkout = CheckoutSession::new(cart_id);
        if let Some(user) = self.known_user().await? {
            checkout.complete_account(user)?;
        }
        self.storage.save_checkout(&checkout).await?;

        add_breadcrumb("checkout", "Checkout started", Some(&[("cart_id", cart_id)]));
        tracing::info!(tenant = %self.storage.tenant(), cart_id, "Checkout started");
        Ok(checkout)
    }

    /// The visitor's current checkout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no checkout was started.
    pub async fn current(&self) -> Result<CheckoutSession> {
        self.storage
            .checkout()
            .await?
            .ok_or_else(|| AppError::NotFound("checkout".to_string()))
    }

    /// Apply a pure transition to the stored checkout and persist it.
    async fn update<T>(
        &self,
        f: impl FnOnce(&mut CheckoutSession) -> std::result::Result<T, CheckoutError>,
    ) -> Result<(CheckoutSession, T)> {
        let mut checkout = self.current().await?;
        let value = f(&mut checkout)?;
        self.storage.save_checkout(&checkout).await?;
        Ok((checkout, value))
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// # Errors
    ///
    /// Returns a checkout error if the step is not reachable.
    #[instrument(skip(self))]
    pub async fn choose_fulfillment(&self, method: FulfillmentMethod) -> Result<CheckoutSession> {
        let (checkout, ()) = self.update(|c| c.choose_fulfillment(method)).await?;
        Ok(checkout)
    }

    /// Select the shipping address and re-price the cart for it.
    ///
    /// A logged-in shopper's new or edited address is saved to their account
    /// first. If saving fails for any reason other than an expired token the
    /// address is used for this order only.
    ///
    /// # Errors
    ///
    /// Returns a checkout error if the step is not reachable, validation
    /// errors for a bad draft, or an API error if the cart cannot be fetched.
    #[instrument(skip(self, selection))]
    pub async fn select_shipping(
        &self,
        selection: ShippingSelection,
    ) -> Result<(CheckoutSession, ShippingOutcome)> {
        let checkout = self.current().await?;
        checkout.check_reachable(Step::ShippingAddress)?;

        let address = match selection {
            ShippingSelection::Saved { address } => address.retagged(AddressType::Shipping),
            ShippingSelection::New { address, save } => {
                self.resolve_draft(None, address, save, AddressType::Shipping)
                    .await?
            }
            ShippingSelection::Edited { id, address } => {
                self.resolve_draft(Some(id), address, true, AddressType::Shipping)
                    .await?
            }
        };

        let location = address.location();
        if let Err(e) = self.storage.set(StorageKey::Location, &location).await {
            tracing::warn!(error = %e, "Failed to store shipping location");
        }

        let token = self.storage.access_token().await?;
        let cart = self
            .api
            .get_cart(
                self.storage.tenant(),
                token.as_deref(),
                checkout.cart_id(),
                Some(&location),
            )
            .await?;

        let (checkout, outcome) = self
            .update(|c| c.propose_shipping_address(address, &cart))
            .await?;
        if let ShippingOutcome::NeedsRemoval(lines) = &outcome {
            tracing::info!(
                tenant = %self.storage.tenant(),
                blocked = lines.len(),
                "Cart has lines that cannot ship to the selected address"
            );
        }
        Ok((checkout, outcome))
    }

    /// Remove the lines blocking the pending address, then accept it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoPendingShipping` if nothing is pending, or an
    /// API error.
    #[instrument(skip(self))]
    pub async fn confirm_removal(&self) -> Result<(CheckoutSession, ShippingOutcome)> {
        let checkout = self.current().await?;
        checkout.check_reachable(Step::ShippingAddress)?;
        let pending = checkout
            .pending_shipping()
            .ok_or(CheckoutError::NoPendingShipping)?;
        let location = pending.location();
        let token = self.storage.access_token().await?;
        let tenant = self.storage.tenant();

        let cart = self
            .api
            .get_cart(tenant, token.as_deref(), checkout.cart_id(), Some(&location))
            .await?;
        let blocked = line_ids(&non_deliverable_lines(&cart));
        let cart = if blocked.is_empty() {
            cart
        } else {
            tracing::info!(
                tenant = %tenant,
                removed = blocked.len(),
                "Removing non-deliverable lines"
            );
            self.api
                .remove_cart_lines(
                    tenant,
                    token.as_deref(),
                    checkout.cart_id(),
                    &blocked,
                    Some(&location),
                )
                .await?
        };

        self.update(|c| c.confirm_non_deliverable_removal(&cart))
            .await
    }

    /// Keep the cart and drop the pending address.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoPendingShipping` if nothing is pending.
    pub async fn cancel_pending(&self) -> Result<(CheckoutSession, Address)> {
        self.update(CheckoutSession::cancel_pending_shipping).await
    }

    /// # Errors
    ///
    /// Returns a checkout error for invalid details or an unreachable step.
    pub async fn recipient(&self, details: Option<RecipientDetails>) -> Result<CheckoutSession> {
        let (checkout, ()) = self
            .update(|c| match details {
                Some(details) => c.complete_recipient_details(details),
                None => c.skip_recipient_details(),
            })
            .await?;
        Ok(checkout)
    }

    /// # Errors
    ///
    /// Returns a checkout error for invalid preferences or an unreachable
    /// step.
    pub async fn delivery_preferences(
        &self,
        preferences: Option<DeliveryPreferences>,
    ) -> Result<CheckoutSession> {
        let today = Utc::now().date_naive();
        let (checkout, ()) = self
            .update(|c| match preferences {
                Some(preferences) => c.complete_delivery_preferences(preferences, today),
                None => c.skip_delivery_preferences(),
            })
            .await?;
        Ok(checkout)
    }

    /// # Errors
    ///
    /// Returns a checkout error for invalid details or an unreachable step.
    pub async fn pickup(&self, details: PickupDetails) -> Result<CheckoutSession> {
        let today = Utc::now().date_naive();
        let (checkout, ()) = self
            .update(|c| c.complete_pickup_details(details, today))
            .await?;
        Ok(checkout)
    }

    /// # Errors
    ///
    /// Returns a checkout error if the step is not reachable or there is no
    /// shipping address to copy.
    #[instrument(skip(self, selection))]
    pub async fn billing(&self, selection: BillingSelection) -> Result<CheckoutSession> {
        self.current()
            .await?
            .check_reachable(Step::BillingAddress)?;

        let choice = match selection {
            BillingSelection::SameAsShipping => BillingChoice::SameAsShipping,
            BillingSelection::Saved { address } => {
                BillingChoice::Address(address.retagged(AddressType::Billing))
            }
            BillingSelection::New { address, save } => BillingChoice::Address(
                self.resolve_draft(None, address, save, AddressType::Billing)
                    .await?,
            ),
        };

        let (checkout, ()) = self.update(|c| c.complete_billing(choice)).await?;
        Ok(checkout)
    }

    /// # Errors
    ///
    /// Returns a checkout error if the method does not suit the fulfillment
    /// method or the step is not reachable.
    pub async fn payment(&self, method: PaymentMethod) -> Result<CheckoutSession> {
        let (checkout, ()) = self.update(|c| c.complete_payment(method)).await?;
        Ok(checkout)
    }

    /// # Errors
    ///
    /// Returns a checkout error for a step outside the active flow.
    pub async fn reopen(&self, step: Step) -> Result<CheckoutSession> {
        let (checkout, ()) = self.update(|c| c.reopen(step)).await?;
        Ok(checkout)
    }

    /// Place the order.
    ///
    /// On failure the checkout stays on the payment step so the shopper can
    /// retry. On success the cart is invalidated.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Incomplete` before every step is done, or an
    /// API error from the order call.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<(CheckoutSession, PlacedOrder)> {
        let mut checkout = self.current().await?;
        let payload = OrderPayload::assemble(&checkout)?;
        let token = self.storage.access_token().await?;
        let tenant = self.storage.tenant();

        let order = match self
            .api
            .place_order(tenant, token.as_deref(), &payload)
            .await
        {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(tenant = %tenant, error = %e, "Order placement failed");
                return Err(e.into());
            }
        };

        checkout.mark_submitted(order.clone())?;
        self.storage.save_checkout(&checkout).await?;

        if let Err(e) = self
            .api
            .invalidate_cart(tenant, token.as_deref(), checkout.cart_id())
            .await
        {
            tracing::warn!(tenant = %tenant, error = %e, "Failed to invalidate cart after order");
        }

        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_number", order.order_number.as_str())]),
        );
        tracing::info!(tenant = %tenant, order_id = %order.id, "Order placed");
        Ok((checkout, order))
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// The checkout's cart, priced for the stored shipping location.
    ///
    /// # Errors
    ///
    /// Returns an API error if the cart cannot be fetched.
    pub async fn cart(&self) -> Result<Cart> {
        let checkout = self.current().await?;
        let token = self.storage.access_token().await?;
        let location = self.storage.location().await?;
        Ok(self
            .api
            .get_cart(
                self.storage.tenant(),
                token.as_deref(),
                checkout.cart_id(),
                location.as_ref(),
            )
            .await?)
    }

    /// # Errors
    ///
    /// Returns an API error.
    pub async fn shipping_methods(&self) -> Result<Arc<Vec<ShippingMethod>>> {
        Ok(self.api.shipping_methods(self.storage.tenant()).await?)
    }

    /// # Errors
    ///
    /// Returns an API error.
    pub async fn stores(&self) -> Result<Arc<Vec<Store>>> {
        Ok(self.api.stores(self.storage.tenant()).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn known_user(&self) -> Result<Option<CheckoutUser>> {
        if let Some(user) = self.storage.auth_user().await? {
            return Ok(Some(CheckoutUser {
                email: user.email,
                name: user.name,
                is_guest: false,
            }));
        }
        Ok(self.storage.guest_user().await?.map(|guest| CheckoutUser {
            email: guest.email,
            name: guest.name,
            is_guest: true,
        }))
    }

    /// Validate a draft and, for a logged-in shopper, save it to the account.
    async fn resolve_draft(
        &self,
        id: Option<AddressId>,
        mut draft: AddressDraft,
        save: bool,
        address_type: AddressType,
    ) -> Result<Address> {
        draft.address_type = address_type;
        draft.validate().map_err(AppError::Validation)?;

        let token = match self.storage.access_token().await? {
            Some(token) if save => token,
            _ => return Ok(Address::from_draft(draft)),
        };

        let tenant = self.storage.tenant();
        let saved = match id {
            Some(id) => self.api.update_address(tenant, &token, id, &draft).await,
            None => self.api.create_address(tenant, &token, &draft).await,
        };

        match saved {
            Ok(address) => Ok(address),
            Err(e) if e.is_unauthorized() => Err(AppError::Api(e)),
            Err(e) => {
                log_save_failure(&e);
                Ok(Address::from_draft(draft))
            }
        }
    }
}

fn log_save_failure(error: &ApiError) {
    tracing::warn!(error = %error, "Failed to save address, using it for this order only");
}
