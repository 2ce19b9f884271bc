// Job launch, monitoring and output retrieval.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ApiClient, Params};
use crate::envelope::required_str;
use crate::error::{CgError, Result};
use crate::files::ConfigDocument;

const JOB: &str = "job";
const JOB_OUTPUT: &str = "joboutput";

/// Optional compute request. Only the keys that were asked for are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Computation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncpu: Option<u32>,
    /// Minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub walltime: Option<f64>,
}

impl Computation {
    pub fn is_empty(&self) -> bool {
        self.ncpu.is_none() && self.walltime.is_none()
    }

    fn validate(&self) -> Result<()> {
        if self.ncpu == Some(0) {
            return Err(CgError::InvalidArgument("ncpu must be greater than 0".into()));
        }
        if let Some(w) = self.walltime {
            if !(w.is_finite() && w > 0.0) {
                return Err(CgError::InvalidArgument(format!(
                    "walltime must be a positive number of minutes, got {w}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LaunchRequest<'a> {
    pub token: &'a str,
    pub jobname: &'a str,
    pub appname: &'a str,
    pub owner: &'a str,
    pub config: &'a ConfigDocument,
    pub computation: Computation,
}

fn launch_params(req: &LaunchRequest<'_>) -> Result<Params> {
    req.computation.validate()?;
    let mut params: Params = vec![
        ("token", req.token.to_string()),
        ("name", req.jobname.to_string()),
        ("app", req.appname.to_string()),
        ("owner", req.owner.to_string()),
        ("config", req.config.to_compact()),
    ];
    if !req.computation.is_empty() {
        let computation = serde_json::to_string(&req.computation)
            .map_err(|e| CgError::InvalidArgument(format!("computation: {e}")))?;
        params.push(("computation", computation));
    }
    Ok(params)
}

/// Launch a job. Returns the Gateway-assigned job id.
pub fn launch(api: &ApiClient, req: &LaunchRequest<'_>) -> Result<String> {
    let params = launch_params(req)?;
    let result = api.call(Method::POST, JOB, &params)?;
    let id = required_str(&result, &format!("launch of job \"{}\"", req.jobname), "id")?;
    info!("job \"{}\" launched with id {}", req.jobname, id);
    Ok(id)
}

pub fn monitor(api: &ApiClient, token: &str, job_id: &str) -> Result<Value> {
    debug!("monitoring job id \"{}\"", job_id);
    let params: Params = vec![("token", token.to_string()), ("id", job_id.to_string())];
    api.call(Method::GET, JOB, &params)
}

/// URI of the job's output archive.
pub fn output(api: &ApiClient, token: &str, job_id: &str) -> Result<String> {
    debug!("getting job output for job id \"{}\"", job_id);
    let params: Params = vec![("token", token.to_string()), ("id", job_id.to_string())];
    let result = api.call(Method::GET, JOB_OUTPUT, &params)?;
    required_str(&result, &format!("output of job \"{job_id}\""), "uri")
}
