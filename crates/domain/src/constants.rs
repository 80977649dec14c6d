//! Application constants
//!
//! Centralized location for provider endpoints and flow defaults used
//! throughout the application.

// Google
pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const GOOGLE_JWKS_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
pub const GOOGLE_SCOPE: &str = "openid email profile";

// Facebook (Graph API v18)
pub const FACEBOOK_AUTH_ENDPOINT: &str = "https://www.facebook.com/v18.0/dialog/oauth";
pub const FACEBOOK_TOKEN_ENDPOINT: &str = "https://graph.facebook.com/v18.0/oauth/access_token";
pub const FACEBOOK_PROFILE_ENDPOINT: &str = "https://graph.facebook.com/me";
pub const FACEBOOK_PROFILE_FIELDS: &str = "id,name,email,picture";
pub const FACEBOOK_SCOPE: &str = "public_profile,email";

// Discord
pub const DISCORD_AUTH_ENDPOINT: &str = "https://discord.com/api/oauth2/authorize";
pub const DISCORD_TOKEN_ENDPOINT: &str = "https://discord.com/api/oauth2/token";
pub const DISCORD_PROFILE_ENDPOINT: &str = "https://discord.com/api/users/@me";
pub const DISCORD_AVATAR_BASE: &str = "https://cdn.discordapp.com/avatars";
pub const DISCORD_SCOPE: &str = "identify email";

// Flow defaults
pub const PKCE_SESSION_TTL_SECS: u64 = 600;
pub const PKCE_SWEEP_INTERVAL_SECS: u64 = 600;
pub const PROVIDER_HTTP_TIMEOUT_SECS: u64 = 8;
pub const STORAGE_TIMEOUT_SECS: u64 = 5;
pub const SESSION_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const MIN_JWT_SECRET_LEN: usize = 32;
pub const JWKS_CACHE_TTL_SECS: u64 = 3600;

// Routing
pub const API_PREFIX: &str = "/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
