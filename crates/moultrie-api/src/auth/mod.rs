// Azure AD B2C authentication
//
// `login` drives the four-step PKCE exchange, `token` owns the current
// token pair and its refresh/re-login recovery path.

pub mod claims;
pub mod cookies;
pub mod login;
pub mod pkce;
pub mod token;
