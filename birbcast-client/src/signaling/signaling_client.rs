use crate::error::SignalingError;
use async_trait::async_trait;
use birbcast_core::{OfferRequest, SessionDescription};

/// Трейт обмена SDP: отправить Offer на сервер и получить Answer.
/// Реализуется HTTP клиентом или тестовой заглушкой.
#[async_trait]
pub trait SignalingClient: Send + Sync {
    /// Один запрос, одна попытка. Повторы решает контроллер сессии.
    async fn exchange(&self, request: &OfferRequest) -> Result<SessionDescription, SignalingError>;
}
