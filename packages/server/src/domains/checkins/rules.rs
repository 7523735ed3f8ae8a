use crate::common::ApiError;

/// Most check-in log entries one participant may have.
pub const MAX_CHECKINS_PER_PARTICIPANT: i64 = 2;

pub fn can_check_in(recorded: i64) -> bool {
    recorded < MAX_CHECKINS_PER_PARTICIPANT
}

pub fn remaining(recorded: i64) -> i64 {
    (MAX_CHECKINS_PER_PARTICIPANT - recorded).max(0)
}

pub fn ensure_can_check_in(recorded: i64) -> Result<(), ApiError> {
    if can_check_in(recorded) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Participant has reached the maximum number of check-ins ({})",
            MAX_CHECKINS_PER_PARTICIPANT
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_checkins_allowed() {
        assert!(can_check_in(0));
        assert!(can_check_in(1));
        assert!(!can_check_in(2));
        assert!(ensure_can_check_in(1).is_ok());
        assert!(ensure_can_check_in(2).is_err());
    }

    #[test]
    fn remaining_never_negative() {
        assert_eq!(remaining(0), 2);
        assert_eq!(remaining(2), 0);
        assert_eq!(remaining(5), 0);
    }
}
