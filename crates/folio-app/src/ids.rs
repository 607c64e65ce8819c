// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

macro_rules! sequence_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            /// Next id in sequence. Zero is reserved for "never issued", so the
            /// counter skips it on wrap.
            pub const fn next(self) -> Self {
                match self.0.wrapping_add(1) {
                    0 => Self(1),
                    value => Self(value),
                }
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

sequence_id!(RequestId);
sequence_id!(ErrorToken);
