//! Built-in gate behaviors.

use crate::behavior::Evaluation;
use serde_json::Value;
use silica_core::{LogicValue, NodeConfig, NodeState, PortValues};
use std::collections::VecDeque;

/// Built-in behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinGate {
    /// High when `a` and `b` are high
    And,
    /// High when `a` or `b` is high
    Or,
    /// Inverted `And`
    Nand,
    /// Inverted `Or`
    Nor,
    /// High when exactly one of `a`, `b` is high
    Xor,
    /// Inverted `Xor`
    Xnor,
    /// Inverts `in`
    Not,
    /// Constant high
    PowerSource,
    /// Level held in `state.isOn`
    Switch,
    /// Passthrough of a single input
    Wire,
    /// High for the first `period / 2` ticks of every `period`-tick window
    Clock,
    /// Emits its input from `delay` ticks earlier
    Delay,
}

impl BuiltinGate {
    /// Type names registered for built-ins, and the gate each selects
    pub const TYPE_NAMES: &'static [(&'static str, BuiltinGate)] = &[
        ("AND", Self::And),
        ("OR", Self::Or),
        ("NAND", Self::Nand),
        ("NOR", Self::Nor),
        ("XOR", Self::Xor),
        ("XNOR", Self::Xnor),
        ("NOT", Self::Not),
        ("PowerSource", Self::PowerSource),
        ("Switch", Self::Switch),
        ("INPUT", Self::Switch),
        ("Wire", Self::Wire),
        ("Lamp", Self::Wire),
        ("OUTPUT", Self::Wire),
        ("Clock", Self::Clock),
        ("Delay", Self::Delay),
    ];

    /// Default clock period when `config.period` is absent
    pub const DEFAULT_PERIOD: u64 = 2;
    /// Default delay depth when `config.delay` is absent
    pub const DEFAULT_DELAY: u64 = 1;

    /// Resolve a built-in type name
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::TYPE_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, gate)| *gate)
    }

    /// Whether a node type is externally driven (`Switch`/`INPUT` family)
    #[must_use]
    pub fn is_input_type(name: &str) -> bool {
        Self::from_type_name(name) == Some(Self::Switch)
    }

    /// Evaluate one node for one tick
    #[must_use]
    pub fn evaluate(&self, inputs: &PortValues, state: &NodeState, config: &NodeConfig) -> Evaluation {
        match self {
            Self::And => binary(inputs, state, LogicValue::and),
            Self::Or => binary(inputs, state, LogicValue::or),
            Self::Nand => binary(inputs, state, |a, b| a.and(b).not()),
            Self::Nor => binary(inputs, state, |a, b| a.or(b).not()),
            Self::Xor => binary(inputs, state, LogicValue::xor),
            Self::Xnor => binary(inputs, state, |a, b| a.xor(b).not()),
            Self::Not => Evaluation::single(single_input(inputs).not(), state),
            Self::PowerSource => Evaluation::single(LogicValue::High, state),
            Self::Switch => {
                let on = state.get("isOn").map(LogicValue::from_json).unwrap_or_default();
                Evaluation::single(on, state)
            }
            Self::Wire => Evaluation::single(single_input(inputs), state),
            Self::Clock => clock(state, config),
            Self::Delay => delay(inputs, state, config),
        }
    }
}

fn read(inputs: &PortValues, primary: &str, alias: &str) -> LogicValue {
    inputs
        .get(primary)
        .or_else(|| inputs.get(alias))
        .copied()
        .unwrap_or_default()
}

fn binary(
    inputs: &PortValues,
    state: &NodeState,
    op: impl Fn(LogicValue, LogicValue) -> LogicValue,
) -> Evaluation {
    let a = read(inputs, "a", "in1");
    let b = read(inputs, "b", "in2");
    Evaluation::single(op(a, b), state)
}

/// `in`, then the binary aliases, then whatever single port is connected.
fn single_input(inputs: &PortValues) -> LogicValue {
    ["in", "a", "in1"]
        .iter()
        .find_map(|port| inputs.get(*port))
        .or_else(|| inputs.values().next())
        .copied()
        .unwrap_or_default()
}

fn config_u64(config: &NodeConfig, key: &str, default: u64) -> u64 {
    config
        .get(key)
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(default)
}

fn clock(state: &NodeState, config: &NodeConfig) -> Evaluation {
    let period = config_u64(config, "period", BuiltinGate::DEFAULT_PERIOD).max(1);
    let tick = state.get("tick").and_then(Value::as_u64).unwrap_or(0);
    let high = tick % period < period / 2;

    let mut next = state.clone();
    next.insert("tick".to_string(), Value::from(tick + 1));
    Evaluation::single(LogicValue::from_bool(high), &next)
}

fn delay(inputs: &PortValues, state: &NodeState, config: &NodeConfig) -> Evaluation {
    let depth = config_u64(config, "delay", BuiltinGate::DEFAULT_DELAY) as usize;
    let mut buffer: VecDeque<LogicValue> = state
        .get("buffer")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(LogicValue::from_json).collect())
        .unwrap_or_default();

    buffer.push_back(single_input(inputs));
    let out = if buffer.len() > depth {
        buffer.pop_front().unwrap_or_default()
    } else {
        LogicValue::Low
    };

    let mut next = state.clone();
    next.insert(
        "buffer".to_string(),
        Value::Array(buffer.iter().map(|v| Value::from(v.as_u8())).collect()),
    );
    Evaluation::single(out, &next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const L: LogicValue = LogicValue::Low;
    const H: LogicValue = LogicValue::High;

    fn ports(pairs: &[(&str, LogicValue)]) -> PortValues {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn eval(gate: BuiltinGate, a: LogicValue, b: LogicValue) -> LogicValue {
        gate.evaluate(&ports(&[("a", a), ("b", b)]), &NodeState::new(), &NodeConfig::new())
            .outputs["out"]
    }

    #[test]
    fn test_truth_tables() {
        assert_eq!(eval(BuiltinGate::And, H, H), H);
        assert_eq!(eval(BuiltinGate::And, H, L), L);
        assert_eq!(eval(BuiltinGate::Or, L, H), H);
        assert_eq!(eval(BuiltinGate::Or, L, L), L);
        assert_eq!(eval(BuiltinGate::Xor, H, H), L);
        assert_eq!(eval(BuiltinGate::Xor, H, L), H);
        assert_eq!(eval(BuiltinGate::Nand, H, H), L);
        assert_eq!(eval(BuiltinGate::Nand, L, H), H);
        assert_eq!(eval(BuiltinGate::Nor, L, L), H);
        assert_eq!(eval(BuiltinGate::Xnor, H, H), H);
    }

    #[test]
    fn test_input_aliases() {
        let out = BuiltinGate::And
            .evaluate(&ports(&[("in1", H), ("in2", H)]), &NodeState::new(), &NodeConfig::new())
            .outputs["out"];
        assert_eq!(out, H);
    }

    #[test]
    fn test_missing_inputs_default_low() {
        assert_eq!(
            BuiltinGate::Or
                .evaluate(&PortValues::new(), &NodeState::new(), &NodeConfig::new())
                .outputs["out"],
            L
        );
        assert_eq!(
            BuiltinGate::Not
                .evaluate(&PortValues::new(), &NodeState::new(), &NodeConfig::new())
                .outputs["out"],
            H
        );
    }

    #[test]
    fn test_switch_reads_state() {
        let mut state = NodeState::new();
        let out = BuiltinGate::Switch.evaluate(&PortValues::new(), &state, &NodeConfig::new());
        assert_eq!(out.outputs["out"], L);

        state.insert("isOn".to_string(), json!(true));
        let out = BuiltinGate::Switch.evaluate(&PortValues::new(), &state, &NodeConfig::new());
        assert_eq!(out.outputs["out"], H);
    }

    #[test]
    fn test_wire_passthrough() {
        let out = BuiltinGate::Wire.evaluate(&ports(&[("in", H)]), &NodeState::new(), &NodeConfig::new());
        assert_eq!(out.outputs["out"], H);
        let out = BuiltinGate::Wire.evaluate(&ports(&[("x", H)]), &NodeState::new(), &NodeConfig::new());
        assert_eq!(out.outputs["out"], H);
    }

    #[test]
    fn test_clock_period_four() {
        let mut config = NodeConfig::new();
        config.insert("period".to_string(), json!(4));
        let mut state = NodeState::new();
        let mut seen = Vec::new();
        for _ in 0..8 {
            let out = BuiltinGate::Clock.evaluate(&PortValues::new(), &state, &config);
            seen.push(out.outputs["out"].as_u8());
            state = out.state;
        }
        assert_eq!(seen, vec![1, 1, 0, 0, 1, 1, 0, 0]);
        assert_eq!(state["tick"], json!(8));
    }

    #[test]
    fn test_delay_two_ticks() {
        let mut config = NodeConfig::new();
        config.insert("delay".to_string(), json!(2));
        let mut state = NodeState::new();
        let mut seen = Vec::new();
        for _ in 0..5 {
            let out = BuiltinGate::Delay.evaluate(&ports(&[("in", H)]), &state, &config);
            seen.push(out.outputs["out"].as_u8());
            state = out.state;
        }
        assert_eq!(seen, vec![0, 0, 1, 1, 1]);
        assert_eq!(state["buffer"], json!([1, 1]));
    }

    #[test]
    fn test_delay_zero_is_passthrough() {
        let mut config = NodeConfig::new();
        config.insert("delay".to_string(), json!(0));
        let out = BuiltinGate::Delay.evaluate(&ports(&[("in", H)]), &NodeState::new(), &config);
        assert_eq!(out.outputs["out"], H);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(BuiltinGate::from_type_name("INPUT"), Some(BuiltinGate::Switch));
        assert_eq!(BuiltinGate::from_type_name("OUTPUT"), Some(BuiltinGate::Wire));
        assert!(BuiltinGate::is_input_type("Switch"));
        assert!(!BuiltinGate::is_input_type("Lamp"));
        assert_eq!(BuiltinGate::from_type_name("FLIPFLOP"), None);
    }

    fn run(gate: BuiltinGate, config: &NodeConfig, inputs: &[LogicValue]) -> Vec<LogicValue> {
        let mut state = NodeState::new();
        inputs
            .iter()
            .map(|level| {
                let out = gate.evaluate(&ports(&[("in", *level)]), &state, config);
                state = out.state;
                out.outputs["out"]
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_clock_high_for_first_half_of_each_period(period in 1u64..16, windows in 1usize..4) {
            let mut config = NodeConfig::new();
            config.insert("period".to_string(), json!(period));
            let ticks = period as usize * windows;
            let seen = run(BuiltinGate::Clock, &config, &vec![L; ticks]);
            for (t, level) in seen.iter().enumerate() {
                let t = t as u64;
                prop_assert_eq!(*level, LogicValue::from_bool(t % period < period / 2));
            }
        }

        #[test]
        fn prop_delay_shifts_input(depth in 0usize..5, bits in prop::collection::vec(any::<bool>(), 0..24)) {
            let mut config = NodeConfig::new();
            config.insert("delay".to_string(), json!(depth));
            let inputs: Vec<LogicValue> = bits.into_iter().map(LogicValue::from_bool).collect();
            let seen = run(BuiltinGate::Delay, &config, &inputs);
            for (t, level) in seen.iter().enumerate() {
                let expected = if t >= depth { inputs[t - depth] } else { L };
                prop_assert_eq!(*level, expected);
            }
        }
    }
}
