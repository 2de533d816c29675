use serde::{Deserialize, Serialize};

use super::types::CensusError;
use crate::models::Provider;

/// Error categories surfaced in reports. Serialized names match the
/// taxonomy printed in the errors section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "AuthError")]
    Auth,
    #[serde(rename = "PermissionError")]
    Permission,
    #[serde(rename = "ThrottleError")]
    Throttle,
    #[serde(rename = "TransientNetworkError")]
    TransientNetwork,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "RegionDiscoveryError")]
    RegionDiscovery,
    #[serde(rename = "TimeoutError")]
    Timeout,
    #[serde(rename = "ProviderSetupError")]
    ProviderSetup,
    #[serde(rename = "ApiError")]
    Api,
    #[serde(rename = "ConfigError")]
    Config,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "AuthError",
            Self::Permission => "PermissionError",
            Self::Throttle => "ThrottleError",
            Self::TransientNetwork => "TransientNetworkError",
            Self::NotFound => "NotFoundError",
            Self::RegionDiscovery => "RegionDiscoveryError",
            Self::Timeout => "TimeoutError",
            Self::ProviderSetup => "ProviderSetupError",
            Self::Api => "ApiError",
            Self::Config => "ConfigError",
            Self::Internal => "InternalError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassification {
    pub kind: ErrorKind,
    pub retryable: bool,
}

impl CensusError {
    /// Classify this error to determine its kind and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        let (kind, retryable) = match self {
            // Retryable errors
            CensusError::Throttle(_) => (ErrorKind::Throttle, true),
            CensusError::TransientNetwork(_) => (ErrorKind::TransientNetwork, true),
            CensusError::Timeout(_) => (ErrorKind::Timeout, true),

            // Non-retryable errors
            CensusError::Auth(_) => (ErrorKind::Auth, false),
            CensusError::Permission(_) => (ErrorKind::Permission, false),
            CensusError::NotFound(_) => (ErrorKind::NotFound, false),
            CensusError::RegionDiscovery(_) => (ErrorKind::RegionDiscovery, false),
            CensusError::ProviderSetup(_) => (ErrorKind::ProviderSetup, false),
            CensusError::Config(_) => (ErrorKind::Config, false),
            CensusError::Yaml(_) => (ErrorKind::Config, false),

            // Default: retryable
            CensusError::Api { .. } => (ErrorKind::Api, true),
            CensusError::Io(_) => (ErrorKind::TransientNetwork, true),
            CensusError::Json(_) => (ErrorKind::Internal, false),
            CensusError::Csv(_) => (ErrorKind::Internal, false),
            CensusError::Internal(_) => (ErrorKind::Internal, false),
        };
        ErrorClassification { kind, retryable }
    }
}

/// Map a provider-native error code onto the shared taxonomy.
///
/// AWS codes are the `Error.Code` strings returned by the service APIs, Azure codes are
/// ARM error codes or bare HTTP statuses, GCP codes are canonical gRPC status names
/// (plus the `SERVICE_DISABLED` reason for APIs that are not enabled on a project).
/// Unknown codes become [`CensusError::Api`].
pub fn classify_provider_error(provider: Provider, code: &str, message: &str) -> CensusError {
    let msg = if message.is_empty() { code.to_string() } else { message.to_string() };
    match provider {
        Provider::Aws => classify_aws(code, msg),
        Provider::Azure => classify_azure(code, msg),
        Provider::Gcp => classify_gcp(code, msg),
    }
}

fn classify_aws(code: &str, msg: String) -> CensusError {
    match code {
        "Throttling" | "ThrottlingException" | "RequestLimitExceeded" | "TooManyRequestsException"
        | "RequestThrottled" | "SlowDown" | "ProvisionedThroughputExceededException" => {
            CensusError::Throttle(msg)
        }
        "RequestTimeout" | "RequestTimeoutException" | "ServiceUnavailable"
        | "ServiceUnavailableException" | "InternalError" | "InternalFailure"
        | "ConnectionReset" | "DispatchFailure" => CensusError::TransientNetwork(msg),
        "AuthFailure" | "InvalidClientTokenId" | "ExpiredToken" | "ExpiredTokenException"
        | "UnrecognizedClientException" | "SignatureDoesNotMatch" | "MissingAuthenticationToken"
        | "NoCredentials" => CensusError::Auth(msg),
        "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation"
        | "UnauthorizedException" => CensusError::Permission(msg),
        "OptInRequired" | "InvalidInputException" | "ResourceNotFoundException"
        | "ClusterNotFoundException" | "SubscriptionRequiredException" | "InvalidRegion" => {
            CensusError::NotFound(msg)
        }
        _ => CensusError::Api { code: code.to_string(), message: msg },
    }
}

fn classify_azure(code: &str, msg: String) -> CensusError {
    match code {
        "TooManyRequests" | "429" | "SubscriptionRequestsThrottled" => CensusError::Throttle(msg),
        "ServiceUnavailable" | "503" | "GatewayTimeout" | "504" | "InternalServerError" | "500"
        | "RequestTimeout" | "408" => CensusError::TransientNetwork(msg),
        "InvalidAuthenticationToken" | "ExpiredAuthenticationToken" | "AuthenticationFailed"
        | "401" => CensusError::Auth(msg),
        "AuthorizationFailed" | "Forbidden" | "403" => CensusError::Permission(msg),
        "NotFound" | "404" | "SubscriptionNotFound" | "ResourceGroupNotFound"
        | "MissingSubscriptionRegistration" | "NoRegisteredProviderFound" => {
            CensusError::NotFound(msg)
        }
        _ => CensusError::Api { code: code.to_string(), message: msg },
    }
}

fn classify_gcp(code: &str, msg: String) -> CensusError {
    match code {
        "RESOURCE_EXHAUSTED" | "429" | "rateLimitExceeded" => CensusError::Throttle(msg),
        "UNAVAILABLE" | "503" | "DEADLINE_EXCEEDED" | "504" | "INTERNAL" | "500" | "ABORTED" => {
            CensusError::TransientNetwork(msg)
        }
        "UNAUTHENTICATED" | "401" => CensusError::Auth(msg),
        "PERMISSION_DENIED" | "403" => CensusError::Permission(msg),
        "NOT_FOUND" | "404" | "SERVICE_DISABLED" | "FAILED_PRECONDITION" => {
            CensusError::NotFound(msg)
        }
        _ => CensusError::Api { code: code.to_string(), message: msg },
    }
}
