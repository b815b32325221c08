use serde::{Deserialize, Serialize};

use crate::conv::{conv_float, conv_int};

// Newer map files separate connection fields with ESC, older ones with commas
const SEP_ESC: char = '\x1b';
const SEP_COMMA: char = ',';

fn default_times() -> i32 {
    -1
}

///
/// Output
///
/// A single connection on an entity: when `output` fires, `input` is invoked on
/// every entity named `target` after `delay` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub output: String,
    pub target: String,
    pub input: String,
    #[serde(default)]
    pub params: String,
    #[serde(default)]
    pub delay: f64,
    // -1 = unlimited
    #[serde(default = "default_times")]
    pub times: i32,
}

impl Output {
    pub fn new(output: &str, target: &str, input: &str) -> Output {
        Output {
            output: output.to_owned(),
            target: target.to_owned(),
            input: input.to_owned(),
            params: String::new(),
            delay: 0.0,
            times: -1,
        }
    }

    pub fn with_delay(self, delay: f64) -> Output {
        Output { delay, ..self }
    }

    pub fn with_params(self, params: &str) -> Output {
        Output {
            params: params.to_owned(),
            ..self
        }
    }

    pub fn with_times(self, times: i32) -> Output {
        Output { times, ..self }
    }

    pub fn only_once(&self) -> bool {
        self.times == 1
    }

    ///
    /// parse
    ///
    /// Parses the keyvalue form of a connection: `target,input,params,delay,times`
    pub fn parse(output: &str, value: &str) -> Option<Output> {
        let sep = if value.contains(SEP_ESC) {
            SEP_ESC
        } else {
            SEP_COMMA
        };

        let parts: Vec<&str> = value.split(sep).collect();
        if parts.len() < 2 {
            return None;
        }

        Some(Output {
            output: output.to_owned(),
            target: parts[0].to_owned(),
            input: parts[1].to_owned(),
            params: parts.get(2).map(|s| s.to_string()).unwrap_or_default(),
            delay: conv_float(parts.get(3).copied(), 0.0),
            times: conv_int(parts.get(4).copied(), -1),
        })
    }

    ///
    /// combine_times
    ///
    /// Fire count of a connection routed through another one. -1 is unlimited, so it only
    /// constrains when the other side is also unlimited.
    pub fn combine_times(a: i32, b: i32) -> i32 {
        match (a, b) {
            (-1, other) | (other, -1) => other,
            (a, b) => a.min(b),
        }
    }
}
