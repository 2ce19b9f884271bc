// Application registration and configuration.

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::api::{ApiClient, Params};
use crate::envelope::required_str;
use crate::error::Result;
use crate::files::ConfigDocument;

const APP: &str = "app";
const APP_CONFIG: &str = "appconfig";

/// Placeholder description sent on registration. Every field is derived
/// from the app and user names.
fn registration_params(username: &str, appname: &str, token: &str) -> Params {
    vec![
        ("token", token.to_string()),
        ("app", appname.to_string()),
        ("longname", format!("Test app by {username}")),
        ("version", "V0.1".to_string()),
        (
            "info",
            format!(
                "<h2>{appname}</h2><p>Description of App ({appname}) Goes Here</p><p>Author: {username}</p>"
            ),
        ),
        ("author", username.to_string()),
        ("tags", format!("test, app, {username}")),
    ]
}

/// Register an app. Returns the name the Gateway registered it under.
pub fn register(api: &ApiClient, username: &str, appname: &str, token: &str) -> Result<String> {
    let params = registration_params(username, appname, token);
    let result = api.call(Method::POST, APP, &params)?;
    let app = required_str(&result, &format!("app registration for \"{appname}\""), "app")?;
    info!("app \"{}\" successfully registered", app);
    Ok(app)
}

pub fn get_info(api: &ApiClient, appname: &str, token: &str) -> Result<Value> {
    let params: Params = vec![("token", token.to_string()), ("app", appname.to_string())];
    api.call(Method::GET, APP, &params)
}

/// Push a configuration document to an app, sent as compact JSON.
pub fn configure(api: &ApiClient, appname: &str, token: &str, config: &ConfigDocument) -> Result<()> {
    let params: Params = vec![
        ("token", token.to_string()),
        ("app", appname.to_string()),
        ("config", config.to_compact()),
    ];
    api.call(Method::POST, APP_CONFIG, &params)?;
    info!("\"{}\" successfully configured", appname);
    Ok(())
}

pub fn get_config(api: &ApiClient, appname: &str, token: &str) -> Result<Value> {
    let params: Params = vec![("token", token.to_string()), ("app", appname.to_string())];
    api.call(Method::GET, APP_CONFIG, &params)
}
