//! JWKS Rotator Library
//!
//! Rotation lifecycle for asymmetric JWT signing keys:
//! - Derives the published JWKS from stage contents
//! - Publishes it to object storage
//! - Runs the createSecret/setSecret/testSecret/finishSecret steps
//! - Ages out retired keys on a cleanup schedule
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


pub mod aws;
pub mod cleanup;
pub mod clock;
pub mod handler;
pub mod jwks;
pub mod publisher;
pub mod rotation;
pub mod storage;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use handler::RotationHandler;
pub use jwks::{JwksBuilder, JwksOverrides};
pub use publisher::JwksPublisher;
pub use rotation::{RotationContext, RotationError, RotationResult, StepOutcome};
pub use storage::{MemoryObjectStore, ObjectStore, S3ObjectStore, StorageError};
