//! Caller-based access checks.
//!
//! Permissions are a flat membership test on the caller's permission list.
//! Callers without `read_all_payments` only see their own payments.

use payments_types::{AppError, CallerIdentity, Payment, READ_ALL_PAYMENTS, UserId};

pub fn can_read_all(caller: &CallerIdentity) -> bool {
    caller.has_permission(READ_ALL_PAYMENTS)
}

/// Owner filter for listings: `None` for admins, the caller's id otherwise.
pub fn list_scope(caller: &CallerIdentity) -> Option<UserId> {
    if can_read_all(caller) {
        None
    } else {
        Some(caller.user_id)
    }
}

pub fn ensure_can_read(caller: &CallerIdentity, payment: &Payment) -> Result<(), AppError> {
    if payment.user_id == caller.user_id || can_read_all(caller) {
        Ok(())
    } else {
        Err(AppError::Forbidden("access denied".into()))
    }
}

pub fn require(caller: &CallerIdentity, permission: &str) -> Result<(), AppError> {
    if caller.has_permission(permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "missing permission: {}",
            permission
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use payments_types::{CREATE_PAYMENT, PaymentMethod};
    use rust_decimal::Decimal;

    fn caller(permissions: &[&str]) -> CallerIdentity {
        CallerIdentity {
            user_id: UserId::new(),
            email: "caller@example.com".into(),
            role: "user".into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn payment_of(owner: UserId) -> Payment {
        Payment::new_pending(
            owner,
            Decimal::ONE_HUNDRED,
            "",
            PaymentMethod::CreditCard,
            String::new(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_owner_can_read_own_payment() {
        let me = caller(&[]);
        assert!(ensure_can_read(&me, &payment_of(me.user_id)).is_ok());
    }

    #[test]
    fn test_stranger_is_denied() {
        let me = caller(&[CREATE_PAYMENT]);
        let result = ensure_can_read(&me, &payment_of(UserId::new()));
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_admin_reads_everything() {
        let admin = caller(&[READ_ALL_PAYMENTS]);
        assert!(ensure_can_read(&admin, &payment_of(UserId::new())).is_ok());
        assert_eq!(list_scope(&admin), None);
    }

    #[test]
    fn test_list_scope_restricts_regular_callers() {
        let me = caller(&[CREATE_PAYMENT]);
        assert_eq!(list_scope(&me), Some(me.user_id));
    }

    #[test]
    fn test_require_is_exact_match() {
        let me = caller(&["create_payments"]);
        assert!(require(&me, CREATE_PAYMENT).is_err());
        assert!(require(&caller(&[CREATE_PAYMENT]), CREATE_PAYMENT).is_ok());
    }
}
