//! Orders service

use crate::{
    error::{AppError, AppResult},
    models::{
        order::{CreateOrder, Order, OrderDetails, OrderQuery, OrderStatus, UpdateOrder},
        UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct OrdersService {
    repository: Repository,
}

impl OrdersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Place a pending order for the caller
    pub async fn place(&self, claims: &UserClaims, request: &CreateOrder) -> AppResult<OrderDetails> {
        let details = self
            .repository
            .orders
            .create_with_tickets(claims.user_id(), &request.ticket_ids)
            .await?;

        tracing::info!(
            "User {} placed order {} ({} tickets, total {})",
            claims.user_id(),
            details.order.id,
            details.tickets.len(),
            details.order.total_price
        );
        Ok(details)
    }

    /// Admins see every order, buyers only their own
    pub async fn list(&self, claims: &UserClaims, query: &OrderQuery) -> AppResult<(Vec<Order>, i64)> {
        if claims.is_admin() {
            return self.repository.orders.list(query).await;
        }

        let scoped = OrderQuery {
            user_id: Some(claims.user_id()),
            ..query.clone()
        };
        self.repository.orders.list(&scoped).await
    }

    pub async fn get(&self, claims: &UserClaims, id: i64) -> AppResult<OrderDetails> {
        let order = self.get_visible(claims, id).await?;
        let tickets = self.repository.tickets.get_by_order(order.id).await?;
        Ok(OrderDetails { order, tickets })
    }

    pub async fn update_status(
        &self,
        claims: &UserClaims,
        id: i64,
        request: &UpdateOrder,
    ) -> AppResult<OrderDetails> {
        let next = request
            .status
            .ok_or_else(|| AppError::Validation("status is required".to_string()))?;

        let order = self.get_visible(claims, id).await?;
        check_status_change(claims.is_admin(), order.status, next)?;

        let order = self.repository.orders.transition(id, order.status, next).await?;
        tracing::info!("Order {} is now {}", order.id, order.status);

        let tickets = self.repository.tickets.get_by_order(order.id).await?;
        Ok(OrderDetails { order, tickets })
    }

    /// Orders of other users are reported as missing to buyers
    async fn get_visible(&self, claims: &UserClaims, id: i64) -> AppResult<Order> {
        let order = self.repository.orders.get_by_id(id).await?;
        if !claims.is_admin() && order.user_id != claims.user_id() {
            return Err(AppError::NotFound(format!("Order {} not found", id)));
        }
        Ok(order)
    }
}

/// Buyers may only cancel; nobody may leave a terminal state
fn check_status_change(is_admin: bool, current: OrderStatus, next: OrderStatus) -> AppResult<()> {
    if !is_admin && next != OrderStatus::Cancelled {
        return Err(AppError::Authorization(
            "Only administrators can change an order to this status".to_string(),
        ));
    }
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Cannot change order status from {} to {}",
            current, next
        )));
    }
    Ok(())
}
