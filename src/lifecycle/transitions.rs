use crate::entities::booking::BookingStatus;
use crate::error::{AppError, AppResult};

/// Statuses a provider may request through a status update.
pub const FORWARD_STATUSES: [BookingStatus; 5] = [
    BookingStatus::OnTheWay,
    BookingStatus::Started,
    BookingStatus::Delivered,
    BookingStatus::Handover,
    BookingStatus::Completed,
];

/// Single permitted successor of an active status.
pub fn next_status(current: BookingStatus) -> Option<BookingStatus> {
    match current {
        BookingStatus::Accepted => Some(BookingStatus::OnTheWay),
        BookingStatus::OnTheWay => Some(BookingStatus::Started),
        BookingStatus::Started => Some(BookingStatus::Delivered),
        BookingStatus::Delivered => Some(BookingStatus::Handover),
        BookingStatus::Handover => Some(BookingStatus::Completed),
        BookingStatus::Pending | BookingStatus::Completed | BookingStatus::Rejected => None,
    }
}

pub fn allowed_next(current: BookingStatus) -> Vec<BookingStatus> {
    next_status(current).into_iter().collect()
}

pub fn check_advance(current: BookingStatus, requested: BookingStatus) -> AppResult<()> {
    if next_status(current) == Some(requested) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            current,
            allowed: allowed_next(current),
        })
    }
}

/// Whether a provider holding the booking is mid-delivery, i.e. nearby
/// candidates are worth computing for them.
pub fn is_active(status: BookingStatus) -> bool {
    !matches!(
        status,
        BookingStatus::Pending | BookingStatus::Completed | BookingStatus::Rejected
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_each_active_status_has_exactly_one_successor() {
        let active = [
            BookingStatus::Accepted,
            BookingStatus::OnTheWay,
            BookingStatus::Started,
            BookingStatus::Delivered,
            BookingStatus::Handover,
        ];

        for current in active {
            let expected = next_status(current).unwrap();
            for requested in BookingStatus::iter() {
                let result = check_advance(current, requested);
                if requested == expected {
                    assert!(result.is_ok(), "{current} -> {requested} should be allowed");
                } else {
                    match result {
                        Err(AppError::InvalidTransition { current: c, allowed }) => {
                            assert_eq!(c, current);
                            assert_eq!(allowed, vec![expected]);
                        }
                        other => panic!("{current} -> {requested}: unexpected {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_chain_walks_forward_statuses_in_order() {
        let mut walked = Vec::new();
        let mut current = BookingStatus::Accepted;
        while let Some(next) = next_status(current) {
            walked.push(next);
            current = next;
        }
        assert_eq!(walked, FORWARD_STATUSES.to_vec());
    }

    #[test]
    fn test_terminal_and_pending_allow_nothing() {
        for current in [BookingStatus::Pending, BookingStatus::Completed, BookingStatus::Rejected] {
            assert!(allowed_next(current).is_empty());
            assert!(check_advance(current, BookingStatus::OnTheWay).is_err());
        }
    }

    #[test]
    fn test_is_active() {
        assert!(!is_active(BookingStatus::Pending));
        assert!(is_active(BookingStatus::Accepted));
        assert!(is_active(BookingStatus::Handover));
        assert!(!is_active(BookingStatus::Completed));
    }
}
