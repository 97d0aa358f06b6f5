//! Line protocol for driving the routines from another process.
//!
//! Each request is `<routine>$<json parameters>`. Each answer is zero or more
//! `HISTORY <text>` lines followed by `COMPLETE$<json result>` or
//! `ERROR <message>`.

use std::fmt;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::{
    params::ProbeParameters,
    result::ProbeResult,
    routine::Routine,
    routines::ProbeRoutines,
    runtime::{MachineStatus, MotionRuntime},
};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("missing '$' between routine and parameters")]
    MissingSeparator,
    #[error("unknown routine: {0}")]
    UnknownRoutine(String),
    #[error("invalid parameters: {0}")]
    Parameters(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    History(String),
    Complete(ProbeResult),
    Error(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::History(text) => write!(f, "HISTORY {}", text),
            Response::Complete(result) => match serde_json::to_string(result) {
                Ok(json) => write!(f, "COMPLETE${}", json),
                Err(e) => write!(f, "ERROR {}", e),
            },
            Response::Error(message) => write!(f, "ERROR {}", message),
        }
    }
}

pub fn parse_request(line: &str) -> Result<(Routine, ProbeParameters), ProtocolError> {
    let (name, params) = line.split_once('$').ok_or(ProtocolError::MissingSeparator)?;
    let routine = name.trim().parse()?;
    let params = if params.trim().is_empty() {
        ProbeParameters::default()
    } else {
        serde_json::from_str(params)?
    };
    Ok((routine, params))
}

/// Runs one request line to completion.
pub async fn handle_request<R: MotionRuntime, S: MachineStatus>(
    line: &str,
    routines: &mut ProbeRoutines<R, S>,
) -> Vec<Response> {
    let (routine, params) = match parse_request(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("bad request {:?}: {}", line, e);
            return vec![Response::Error(e.to_string())];
        }
    };
    routines.set_parameters(params);
    routines.take_history();
    let outcome = routines.run(routine).await;
    let mut responses: Vec<Response> = routines.take_history().into_iter().map(Response::History).collect();
    responses.push(match outcome {
        Ok(()) => Response::Complete(*routines.result()),
        Err(e) => Response::Error(e.to_string()),
    });
    responses
}

/// Answers requests from `input` until it is exhausted.
pub async fn serve<I, O, R, S>(input: I, mut output: O, routines: &mut ProbeRoutines<R, S>) -> std::io::Result<()>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
    R: MotionRuntime,
    S: MachineStatus,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("request {:?}", line);
        for response in handle_request(line, routines).await {
            output.write_all(format!("{}\n", response).as_bytes()).await?;
        }
        output.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_parse_request() {
        let (routine, params) = parse_request(r#"probe_round_pocket${"diameter_hint": 20, "probe_diam": 2}"#).unwrap();
        assert_eq!(routine, Routine::ProbeRoundPocket);
        assert_eq!(params.diameter_hint, 20.0);

        let (routine, params) = parse_request("wait$").unwrap();
        assert_eq!(routine, Routine::Wait);
        assert_eq!(params, ProbeParameters::default());

        assert!(matches!(parse_request("probe_xp"), Err(ProtocolError::MissingSeparator)));
        assert!(matches!(parse_request("probe_xq${}"), Err(ProtocolError::UnknownRoutine(_))));
        assert!(matches!(parse_request("probe_xp${"), Err(ProtocolError::Parameters(_))));
    }

    #[test]
    pub fn test_response_lines() {
        assert_eq!(Response::History("Outside XP Xp[1.000]".into()).to_string(), "HISTORY Outside XP Xp[1.000]");
        assert_eq!(Response::Error("boom".into()).to_string(), "ERROR boom");
        let complete = Response::Complete(ProbeResult { xp: 1.5, ..Default::default() }).to_string();
        let json = complete.strip_prefix("COMPLETE$").unwrap();
        let result: ProbeResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.xp, 1.5);
    }
}
