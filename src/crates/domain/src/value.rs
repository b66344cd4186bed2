use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// 监听者 ID 最大长度
pub const MAX_LISTENER_ID_LEN: usize = 128;
/// 上报幂等令牌最大长度
pub const MAX_REPORT_ID_LEN: usize = 64;

#[derive(Error, Debug, PartialEq)]
pub enum ValueError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),
}

// 数值型 ID 的 newtype 及常用 trait 实现
macro_rules! define_id {
    ($name:ident $(, $extra:ident)*) => {
        #[derive(Debug, Clone, PartialEq $(, $extra)*)]
        pub struct $name(i64);

        impl $name {
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// 客户端提供的不透明标识：去除首尾空白、非空、限制长度
macro_rules! define_token {
    ($name:ident, $label:expr, $max:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ValueError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ValueError::Empty($label));
                }
                if trimmed.chars().count() > $max {
                    return Err(ValueError::TooLong($label, $max));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(MilestoneId, Eq, Hash);
define_token!(ListenerId, "listener id", MAX_LISTENER_ID_LEN);
define_token!(ReportId, "report id", MAX_REPORT_ID_LEN);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_id_is_trimmed() {
        let id: ListenerId = "  abc-123 ".parse().unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn blank_listener_id_is_rejected() {
        assert_eq!(
            "   ".parse::<ListenerId>(),
            Err(ValueError::Empty("listener id"))
        );
    }

    #[test]
    fn oversized_report_id_is_rejected() {
        let raw = "x".repeat(MAX_REPORT_ID_LEN + 1);
        assert_eq!(
            raw.parse::<ReportId>(),
            Err(ValueError::TooLong("report id", MAX_REPORT_ID_LEN))
        );
    }
}
