//! Booking persistence.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::info;
use zoomzone_core::{Booking, BookingId, BookingPatch};

use crate::error::{ProviderError, ProviderResult};
use crate::json_file;
use crate::provider::BoxFuture;

/// Where confirmed bookings live.
pub trait BookingStore: Send + Sync {
    /// Stores a new booking and returns its id. Duplicate ids are rejected.
    fn insert(&self, booking: Booking) -> BoxFuture<'_, ProviderResult<BookingId>>;

    fn list_all(&self) -> BoxFuture<'_, ProviderResult<Vec<Booking>>>;

    /// Applies `patch` to the booking with `id`.
    fn update<'a>(
        &'a self,
        id: &'a BookingId,
        patch: BookingPatch,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

fn insert_into(bookings: &mut Vec<Booking>, booking: Booking) -> ProviderResult<BookingId> {
    if bookings.iter().any(|b| b.id == booking.id) {
        return Err(ProviderError::storage(format!(
            "booking {} already exists",
            booking.id
        )));
    }
    let id = booking.id.clone();
    bookings.push(booking);
    Ok(id)
}

fn patch_in(bookings: &mut [Booking], id: &BookingId, patch: &BookingPatch) -> ProviderResult<()> {
    let booking = bookings
        .iter_mut()
        .find(|b| &b.id == id)
        .ok_or_else(|| ProviderError::not_found(format!("booking {id} does not exist")))?;
    patch
        .apply(booking)
        .map_err(|e| ProviderError::bad_request(e.to_string()))
}

/// Bookings kept as a JSON array on disk.
#[derive(Debug)]
pub struct FileBookingStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBookingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BookingStore for FileBookingStore {
    fn insert(&self, booking: Booking) -> BoxFuture<'_, ProviderResult<BookingId>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut bookings: Vec<Booking> = json_file::read_or_default(&self.path)?;
            let id = insert_into(&mut bookings, booking)?;
            json_file::write_atomic(&self.path, &bookings)?;
            info!(booking_id = %id, "booking persisted");
            Ok(id)
        })
    }

    fn list_all(&self) -> BoxFuture<'_, ProviderResult<Vec<Booking>>> {
        Box::pin(async move { json_file::read_or_default(&self.path) })
    }

    fn update<'a>(
        &'a self,
        id: &'a BookingId,
        patch: BookingPatch,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut bookings: Vec<Booking> = json_file::read_or_default(&self.path)?;
            patch_in(&mut bookings, id, &patch)?;
            json_file::write_atomic(&self.path, &bookings)
        })
    }
}

/// In-process booking store.
#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    bookings: Mutex<Vec<Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookings(bookings: Vec<Booking>) -> Self {
        Self {
            bookings: Mutex::new(bookings),
        }
    }
}

impl BookingStore for MemoryBookingStore {
    fn insert(&self, booking: Booking) -> BoxFuture<'_, ProviderResult<BookingId>> {
        Box::pin(async move { insert_into(&mut *self.bookings.lock().await, booking) })
    }

    fn list_all(&self) -> BoxFuture<'_, ProviderResult<Vec<Booking>>> {
        Box::pin(async move { Ok(self.bookings.lock().await.clone()) })
    }

    fn update<'a>(
        &'a self,
        id: &'a BookingId,
        patch: BookingPatch,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move { patch_in(&mut self.bookings.lock().await, id, &patch) })
    }
}
