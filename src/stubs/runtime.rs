use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::{
    constants::{INPUT_CHANNEL, OUTPUT_CHANNEL},
    core::{
        error::RuntimeError,
        traits::{
            probe::MemoryProbe,
            runtime::{ChannelId, ChannelKind, Runtime},
        },
    },
};

/// Memory the stub reports before any program is loaded.
const HOST_OVERHEAD_BYTES: u64 = 8 * 1024 * 1024;

/// Program understood by [`RuntimeStub`], loaded from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StubProgram {
    /// Names of the list channels declared on the stage.
    pub lists: Vec<String>,
    /// Number of steps before the program finishes, `None` runs forever.
    pub steps: Option<u32>,
    pub step_ms: u64,
    pub memory_per_step: u64,
    pub output: StubOutput,
    pub start_error: Option<String>,
}

impl Default for StubProgram {
    fn default() -> Self {
        Self {
            lists: vec![INPUT_CHANNEL.to_string(), OUTPUT_CHANNEL.to_string()],
            steps: Some(1),
            step_ms: 1,
            memory_per_step: 0,
            output: StubOutput::default(),
            start_error: None,
        }
    }
}

/// What the program writes to its output list when it finishes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StubOutput {
    #[default]
    Silent,
    Fixed {
        lines: Vec<String>,
    },
    EchoInput,
    SumInput,
}

impl StubOutput {
    fn render(&self, input: &[String]) -> Vec<String> {
        match self {
            StubOutput::Silent => Vec::new(),
            StubOutput::Fixed { lines } => lines.clone(),
            StubOutput::EchoInput => input.to_vec(),
            StubOutput::SumInput => {
                let sum: i64 = input
                    .iter()
                    .filter_map(|line| line.trim().parse::<i64>().ok())
                    .sum();
                vec![sum.to_string()]
            }
        }
    }
}

#[derive(Debug, Default)]
struct StubState {
    lists: DashMap<String, Vec<String>>,
    active_tasks: AtomicUsize,
    heap_bytes: AtomicU64,
}

impl StubState {
    fn finish(&self, program: &StubProgram) {
        let input = self
            .lists
            .get(INPUT_CHANNEL)
            .map(|list| list.clone())
            .unwrap_or_default();
        let output = program.output.render(&input);

        if let Some(mut list) = self.lists.get_mut(OUTPUT_CHANNEL) {
            *list = output;
        }
        self.active_tasks.store(0, Ordering::SeqCst);
    }
}

/// Deterministic in-process runtime. Each step sleeps `step_ms` and grows
/// the simulated heap by `memory_per_step`.
#[derive(Debug)]
pub struct RuntimeStub {
    program: Mutex<Option<StubProgram>>,
    state: Arc<StubState>,
    turbo: AtomicBool,
    stepping: Mutex<Option<JoinHandle<()>>>,
}

impl RuntimeStub {
    pub fn new() -> Self {
        Self {
            program: Mutex::new(None),
            state: Arc::new(StubState::default()),
            turbo: AtomicBool::new(false),
            stepping: Mutex::new(None),
        }
    }

    pub fn turbo_mode(&self) -> bool {
        self.turbo.load(Ordering::SeqCst)
    }

    fn loaded(&self) -> Option<StubProgram> {
        self.program
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn list_name(&self, channel: ChannelId) -> Result<String, RuntimeError> {
        self.loaded()
            .and_then(|program| program.lists.get(channel.0).cloned())
            .ok_or_else(|| RuntimeError::Execution {
                msg: format!("unknown channel {:?}", channel),
            })
    }
}

impl Default for RuntimeStub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Runtime for RuntimeStub {
    #[tracing::instrument(skip_all)]
    async fn load(&self, program: &[u8]) -> Result<(), RuntimeError> {
        let parsed: StubProgram =
            serde_json::from_slice(program).map_err(|e| RuntimeError::Load {
                msg: format!("Failed to parse program: {}", e),
            })?;
        tracing::debug!("Loaded stub program: {:?}", parsed);

        self.stop();
        self.state.lists.clear();
        for name in &parsed.lists {
            self.state.lists.insert(name.clone(), Vec::new());
        }
        self.state
            .heap_bytes
            .store(program.len() as u64, Ordering::SeqCst);

        *self.program.lock().unwrap_or_else(PoisonError::into_inner) = Some(parsed);
        Ok(())
    }

    fn lookup(&self, name: &str, kind: ChannelKind) -> Option<ChannelId> {
        if kind != ChannelKind::List {
            return None;
        }
        self.loaded()?
            .lists
            .iter()
            .position(|list| list == name)
            .map(ChannelId)
    }

    fn write_list(&self, channel: ChannelId, values: Vec<String>) -> Result<(), RuntimeError> {
        let name = self.list_name(channel)?;
        self.state.lists.insert(name, values);
        Ok(())
    }

    fn read_list(&self, channel: ChannelId) -> Result<Vec<String>, RuntimeError> {
        let name = self.list_name(channel)?;
        Ok(self
            .state
            .lists
            .get(&name)
            .map(|list| list.clone())
            .unwrap_or_default())
    }

    fn set_turbo_mode(&self, enabled: bool) {
        self.turbo.store(enabled, Ordering::SeqCst);
    }

    async fn start(&self) -> Result<(), RuntimeError> {
        let program = self.loaded().ok_or_else(|| RuntimeError::Execution {
            msg: "no program loaded".to_string(),
        })?;
        if let Some(msg) = &program.start_error {
            return Err(RuntimeError::Execution { msg: msg.clone() });
        }

        self.state.active_tasks.store(1, Ordering::SeqCst);
        if program.steps == Some(0) {
            self.state.finish(&program);
            return Ok(());
        }

        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            let period = Duration::from_millis(program.step_ms);
            let mut done = 0u32;
            while program.steps.is_none_or(|steps| done < steps) {
                tokio::time::sleep(period).await;
                state
                    .heap_bytes
                    .fetch_add(program.memory_per_step, Ordering::SeqCst);
                done += 1;
            }
            state.finish(&program);
        });

        *self.stepping.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state.active_tasks.load(Ordering::SeqCst) > 0
    }

    fn stop(&self) {
        if let Some(handle) = self
            .stepping
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        self.state.active_tasks.store(0, Ordering::SeqCst);
    }
}

impl MemoryProbe for RuntimeStub {
    fn current_bytes(&self) -> u64 {
        HOST_OVERHEAD_BYTES + self.state.heap_bytes.load(Ordering::SeqCst)
    }
}
