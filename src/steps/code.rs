/// Lua code step
///
/// Runs a user script against the input items inside a fresh, stripped-down
/// Lua state. The script sees `items` (the input JSON values) and returns
/// either a list (one output item per element) or a single value.
///
/// Expected params: { "script": "for _, item in ipairs(items) do item.score = item.score * 2 end return items" }

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mlua::{HookTriggers, Lua, LuaSerdeExt, VmState};
use serde_json::Value;

use crate::runtime::{ExecutionContext, Step, StepDescription, StepError, StepProperty};
use crate::workflow::types::{Item, NodeOutput};

/// How often (in VM instructions) the wall-clock budget is checked
const BUDGET_CHECK_INTERVAL: u32 = 1_000;

/// Globals removed before user code runs
const BLOCKED_GLOBALS: [&str; 10] = [
    "os", "io", "debug", "package", "require", "dofile", "loadfile", "load", "coroutine", "collectgarbage",
];

/// Error-trapping builtins that must re-raise once the budget is spent
const PROTECTED_CALLS: [&str; 2] = ["pcall", "xpcall"];

const BUDGET_EXCEEDED: &str = "script execution budget exceeded";

pub struct CodeStep {
    description: StepDescription,
    budget: Duration,
}

impl CodeStep {
    /// `budget` is the wall-clock limit for one script evaluation
    pub fn new(budget: Duration) -> Self {
        Self {
            description: StepDescription::new("Code", "fa-code").property(
                StepProperty::new("script", "string")
                    .required()
                    .describe("Lua chunk; `items` holds the input JSON, the returned value becomes the output"),
            ),
            budget,
        }
    }
}

#[async_trait]
impl Step for CodeStep {
    fn description(&self) -> &StepDescription {
        &self.description
    }

    async fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<NodeOutput, StepError> {
        let script = ctx.parameter_str("script", 0, None)?;
        let items: Vec<Value> = ctx.input_data().iter().map(|item| item.json.clone()).collect();
        let node_name = ctx.node().name.clone();
        let budget = self.budget;

        tracing::debug!("📝 Lua script for '{}': {}", node_name, script);

        // Lua states are not Send; build and drop the state on the blocking pool
        let values = tokio::task::spawn_blocking(move || run_script(&script, &items, budget, &node_name))
            .await
            .map_err(|e| anyhow::anyhow!("Lua worker task failed: {}", e))??;

        Ok(NodeOutput::single(values.into_iter().map(Item::new).collect()))
    }
}

/// Evaluate `script` with `items` bound, enforcing `budget`
fn run_script(script: &str, items: &[Value], budget: Duration, node_name: &str) -> Result<Vec<Value>, StepError> {
    let lua = Lua::new();

    let timed_out = Arc::new(AtomicBool::new(false));
    let hook_flag = Arc::clone(&timed_out);
    let started = Instant::now();
    lua.set_hook(
        HookTriggers::new().every_nth_instruction(BUDGET_CHECK_INTERVAL),
        move |_lua, _debug| {
            if started.elapsed() > budget {
                hook_flag.store(true, Ordering::SeqCst);
                Err(mlua::Error::runtime(BUDGET_EXCEEDED))
            } else {
                Ok(VmState::Continue)
            }
        },
    )
    .map_err(|e| anyhow::anyhow!("Failed to install Lua budget hook: {}", e))?;

    install_globals(&lua, items, node_name, &timed_out)
        .map_err(|e| anyhow::anyhow!("Failed to set up Lua environment: {}", e))?;

    tracing::debug!("🏃 Executing Lua script with {} item(s)", items.len());
    let result = lua.load(script).eval::<mlua::Value>();

    if timed_out.load(Ordering::SeqCst) {
        tracing::warn!("⏱️ Lua script for '{}' exceeded its {:?} budget", node_name, budget);
        return Err(StepError::Timeout(budget));
    }

    let result = result.map_err(|e| anyhow::anyhow!("Lua script execution failed: {}", e))?;
    let json: Value = lua
        .from_value(result)
        .map_err(|e| anyhow::anyhow!("Lua result is not JSON-compatible: {}", e))?;

    Ok(match json {
        Value::Array(values) => values,
        Value::Null => Vec::new(),
        single => vec![single],
    })
}

/// Bind `items`, the `log`/`now` helpers, and strip unsafe globals
fn install_globals(lua: &Lua, items: &[Value], node_name: &str, timed_out: &Arc<AtomicBool>) -> mlua::Result<()> {
    let globals = lua.globals();

    globals.set("items", lua.to_value(items)?)?;

    let name = node_name.to_string();
    globals.set(
        "log",
        lua.create_function(move |_, message: String| {
            tracing::info!(node = %name, "{}", message);
            Ok(())
        })?,
    )?;

    globals.set(
        "now",
        lua.create_function(|_, ()| Ok(chrono::Utc::now().to_rfc3339()))?,
    )?;

    for blocked in BLOCKED_GLOBALS {
        globals.set(blocked, mlua::Nil)?;
    }

    // A budget error caught by pcall/xpcall is raised again at the call site
    for name in PROTECTED_CALLS {
        let original: mlua::Function = globals.get(name)?;
        let flag = Arc::clone(timed_out);
        globals.set(
            name,
            lua.create_function(move |_, args: mlua::MultiValue| {
                let out: mlua::MultiValue = original.call(args)?;
                if flag.load(Ordering::SeqCst) {
                    return Err(mlua::Error::runtime(BUDGET_EXCEEDED));
                }
                Ok(out)
            })?,
        )?;
    }

    Ok(())
}
