use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smpu_assembler::{compile, Compilation, ExportError};
use smpu_emulator::{Machine, MachineConfig, Memory, Register, StepReport};
use wasm_bindgen::prelude::*;

macro_rules! console_log {
    ($($t:tt)*) => (web_sys::console::log_1(&format!($($t)*).into()))
}

/// JS-facing listing row.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WasmListingRow {
    pub line: usize,
    pub address: Option<u16>,
    pub text: String,
    pub explanation: Vec<String>,
}

/// JS-facing compile result.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WasmCompileResult {
    pub clean: bool,
    pub summary: String,
    pub rows: Vec<WasmListingRow>,
}

/// JS-facing clock result; diagnostics are pre-rendered for the console.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WasmClockResult {
    pub pc: u16,
    pub running: bool,
    pub messages: Vec<String>,
}

fn compile_result(compilation: &Compilation) -> WasmCompileResult {
    WasmCompileResult {
        clean: !compilation.has_errors(),
        summary: compilation.summary().to_string(),
        rows: compilation
            .listing()
            .into_iter()
            .map(|row| WasmListingRow {
                line: row.line,
                address: row.address,
                text: row.text,
                explanation: row.explanation,
            })
            .collect(),
    }
}

fn clock_result(report: &StepReport) -> WasmClockResult {
    WasmClockResult {
        pc: report.pc,
        running: report.running,
        messages: report
            .diagnostics
            .iter()
            .map(|diagnostic| format!("[{}] {diagnostic}", report.pc))
            .collect(),
    }
}

fn restart_with(machine: &mut Machine, compilation: &Compilation) -> Result<StepReport, ExportError> {
    let entries = compilation.export()?;
    machine.restart();
    Ok(machine.load(entries.into_iter().map(<(u16, u8)>::from)))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(value)?)
}

#[wasm_bindgen]
pub struct WasmMachine {
    machine: Machine,
    compilation: Option<Compilation>,
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmMachine {
    /// A machine with one full-range memory.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        let mut machine = Machine::new();
        machine.mount(Box::new(Memory::full_range()));
        Self {
            machine,
            compilation: None,
        }
    }

    /// A machine built from a `MachineConfig` object.
    pub fn with_config(config: JsValue) -> Result<WasmMachine, JsValue> {
        console_error_panic_hook::set_once();
        let config: MachineConfig = serde_wasm_bindgen::from_value(config)?;
        let machine = Machine::with_config(&config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self {
            machine,
            compilation: None,
        })
    }

    /// Compiles `source` and keeps the result for the next restart.
    pub fn compile(&mut self, source: &str) -> Result<JsValue, JsValue> {
        let compilation = compile(source);
        let result = compile_result(&compilation);
        console_log!("{}", result.summary);
        self.compilation = Some(compilation);
        to_js(&result)
    }

    /// Restarts the machine and loads the last clean compile.
    pub fn restart(&mut self) -> Result<JsValue, JsValue> {
        let compilation = self
            .compilation
            .as_ref()
            .ok_or_else(|| JsError::new("nothing has been compiled"))?;
        let report = restart_with(&mut self.machine, compilation)
            .map_err(|e| JsError::new(&e.to_string()))?;
        console_log!("machine restarted");
        to_js(&clock_result(&report))
    }

    /// Executes one instruction.
    pub fn clock(&mut self) -> Result<JsValue, JsValue> {
        let result = clock_result(&self.machine.clock());
        for message in &result.messages {
            console_log!("{message}");
        }
        to_js(&result)
    }

    /// Reads a register by its one-letter name.
    pub fn get_value(&self, name: &str) -> Result<u16, JsValue> {
        let register = Register::from_str(name).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.machine.get_value(register))
    }

    /// Register file as `a=.. b=.. ...`.
    #[must_use]
    pub fn registers(&self) -> String {
        self.machine.registers().to_string()
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }
}
