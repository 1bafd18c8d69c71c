//! Closed vocabularies accepted by the provider and client configuration.

use serde::Serialize;

/// A value that is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue {
    pub vocabulary: &'static str,
    pub value: String,
}

impl std::fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} '{}'", self.vocabulary, self.value)
    }
}

impl std::error::Error for UnknownValue {}

/// Common interface of the closed vocabularies.
pub trait Vocabulary: Copy + PartialEq + std::str::FromStr<Err = UnknownValue> + 'static {
    /// Comma-separated list of accepted values, for messages.
    fn accepted_values() -> String;
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every accepted value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Comma-separated list of accepted values, for messages.
            pub fn accepted() -> String {
                Self::ALL.iter().map(|v| format!("'{}'", v.as_str())).collect::<Vec<_>>().join(", ")
            }
        }

        impl Vocabulary for $name {
            fn accepted_values() -> String {
                Self::accepted()
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownValue {
                        vocabulary: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Provider-wide PKCE enforcement mode.
    PkceEnforcement("PKCE enforcement mode") {
        Always => "always",
        Never => "never",
        PublicClientsOnly => "public_clients_only",
    }
}

vocabulary! {
    /// How user consent is captured for a client.
    ConsentMode("consent mode") {
        /// Resolved by the consent flow depending on whether a
        /// pre-configured duration applies.
        Auto => "auto",
        Explicit => "explicit",
        Implicit => "implicit",
        PreConfigured => "pre-configured",
    }
}

vocabulary! {
    GrantType("grant type") {
        AuthorizationCode => "authorization_code",
        RefreshToken => "refresh_token",
        Implicit => "implicit",
        ClientCredentials => "client_credentials",
    }
}

vocabulary! {
    ResponseType("response type") {
        Code => "code",
        IdToken => "id_token",
        Token => "token",
        IdTokenToken => "id_token token",
        CodeIdToken => "code id_token",
        CodeToken => "code token",
        CodeIdTokenToken => "code id_token token",
    }
}

impl ResponseType {
    /// Whether the authorization endpoint returns a code.
    pub fn issues_code(&self) -> bool {
        self.as_str().split(' ').any(|part| part == "code")
    }

    /// Whether tokens are returned from the authorization endpoint itself.
    pub fn issues_front_channel_tokens(&self) -> bool {
        self.as_str()
            .split(' ')
            .any(|part| part == "id_token" || part == "token")
    }
}

vocabulary! {
    ResponseMode("response mode") {
        FormPost => "form_post",
        Query => "query",
        Fragment => "fragment",
    }
}

vocabulary! {
    Scope("scope") {
        OpenId => "openid",
        OfflineAccess => "offline_access",
        Groups => "groups",
        Email => "email",
        Profile => "profile",
    }
}

vocabulary! {
    PkceChallengeMethod("PKCE challenge method") {
        Plain => "plain",
        S256 => "S256",
    }
}

vocabulary! {
    UserinfoSigningAlgorithm("userinfo signing algorithm") {
        None => "none",
        RS256 => "RS256",
    }
}

vocabulary! {
    /// Endpoints CORS handling can be enabled for.
    CorsEndpoint("CORS endpoint") {
        Authorization => "authorization",
        PushedAuthorizationRequest => "pushed-authorization-request",
        Token => "token",
        Revocation => "revocation",
        Introspection => "introspection",
        Userinfo => "userinfo",
    }
}

impl CorsEndpoint {
    /// Endpoints whose requests carry client or bearer credentials.
    pub fn carries_credentials(&self) -> bool {
        !matches!(self, CorsEndpoint::Authorization)
    }
}
