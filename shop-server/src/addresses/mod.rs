//! Address book service
//!
//! Every operation is scoped to the calling customer. Addresses owned by
//! someone else are refused with `PermissionDenied`.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{Address, AddressInput, CustomerId};

use crate::db::{AddressBook, RepoError};
use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct AddressService {
    book: Arc<dyn AddressBook>,
}

fn not_found(id: i64) -> ServiceError {
    AppError::new(ErrorCode::AddressNotFound)
        .with_detail("id", id)
        .into()
}

impl AddressService {
    pub fn new(book: Arc<dyn AddressBook>) -> Self {
        Self { book }
    }

    pub async fn create(&self, customer: CustomerId, input: AddressInput) -> ServiceResult<Address> {
        let address = self.book.create(customer.get(), input).await?;
        tracing::info!(address_id = address.id, customer_id = customer.get(), "Address created");
        Ok(address)
    }

    pub async fn list(&self, customer: CustomerId) -> ServiceResult<Vec<Address>> {
        Ok(self.book.list_by_customer(customer.get()).await?)
    }

    pub async fn update(
        &self,
        customer: CustomerId,
        id: i64,
        input: AddressInput,
    ) -> ServiceResult<Address> {
        self.owned(customer, id).await?;
        match self.book.update(id, input).await {
            Ok(address) => Ok(address),
            Err(RepoError::NotFound(_)) => Err(not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, customer: CustomerId, id: i64) -> ServiceResult<()> {
        self.owned(customer, id).await?;
        match self.book.delete(id).await {
            Ok(()) => {
                tracing::info!(address_id = id, customer_id = customer.get(), "Address deleted");
                Ok(())
            }
            Err(RepoError::NotFound(_)) => Err(not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Make `id` the customer's only default address
    pub async fn set_default(&self, customer: CustomerId, id: i64) -> ServiceResult<Address> {
        self.owned(customer, id).await?;
        match self.book.set_default(customer.get(), id).await {
            Ok(address) => Ok(address),
            Err(RepoError::NotFound(_)) => Err(not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn owned(&self, customer: CustomerId, id: i64) -> ServiceResult<Address> {
        let address = match self.book.get(id).await {
            Ok(a) => a,
            Err(RepoError::NotFound(_)) => return Err(not_found(id)),
            Err(e) => return Err(e.into()),
        };
        if address.customer_id != customer.get() {
            return Err(AppError::permission_denied("Address belongs to another customer").into());
        }
        Ok(address)
    }
}
