//! AWS region resolution shared by the S3 and Secrets Manager clients
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


use keywarden_config::{AwsConfig, ConfigError, ConfigResult};
use rusoto_core::Region;
use std::str::FromStr;

/// Region for AWS clients
///
/// A custom endpoint produces `Region::Custom` so S3/Secrets Manager
/// compatible services (localstack and friends) can be targeted. Without a
/// configured region rusoto's default lookup applies.
pub fn region_for(aws: &AwsConfig) -> ConfigResult<Region> {
    let region = match aws.region {
        Some(ref name) => Region::from_str(name).map_err(|e| ConfigError::Invalid {
            field: "AWS_REGION",
            reason: e.to_string(),
        })?,
        None => Region::default(),
    };

    Ok(match aws.endpoint {
        Some(ref endpoint) => Region::Custom {
            name: region.name().to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        },
        None => region,
    })
}
