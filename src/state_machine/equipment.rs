//! # Equipment Lifecycle
//!
//! ```text
//!            ┌──────── power_off ───────┐
//!            ▼                          │
//!   Offline ◀──▶ Standby ◀──power_on──▶ Running
//!      │           │                    │
//!      │           └── emergency_stop ──┼──▶ Faulted ◀──▶ UnderMaintenance ──▶ Running
//!      │                                │        (repair order)      (repair succeeded)
//!      └────────────── discard ─────────┴──────────────▶ Discarded (terminal)
//! ```
//!
//! Operations in Running and Standby depend on the equipment category; every other
//! state has a category-independent vocabulary. `emergency_stop` is evaluated ahead
//! of category dispatch and always lands in Faulted.

use super::context::StateContext;
use super::errors::{invalid_argument, StateMachineResult};
use super::states::{shared_registry, LifecycleState};
use crate::config::EquipmentConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Equipment lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentState {
    /// Powered and in service
    Running,
    /// Powered down but ready to resume
    Standby,
    /// Stopped on a fault, awaiting a repair order
    Faulted,
    /// Taken out of service without a fault
    Offline,
    /// Repair order open, technician working
    UnderMaintenance,
    /// Retired permanently
    Discarded,
}

/// Equipment operation vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentOperation {
    PowerOn,
    PowerOff,
    CoolMode,
    HeatMode,
    SetTemperature,
    AdjustBrightness,
    MoveToFloor,
    OpenDoor,
    CloseDoor,
    EmergencyStop,
    TakeOffline,
    BringOnline,
    CreateRepairOrder,
    CompleteRepair,
    Discard,
}

/// Equipment category; decides the operation vocabulary while powered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    AirConditioner,
    Lighting,
    Elevator,
}

impl EquipmentState {
    /// Whether the equipment is drawing power and can be commanded
    pub fn is_powered(&self) -> bool {
        matches!(self, Self::Running | Self::Standby)
    }
}

impl LifecycleState for EquipmentState {
    type Operation = EquipmentOperation;

    const ENTITY_KIND: &'static str = "equipment";

    const ALL: &'static [Self] = &[
        Self::Running,
        Self::Standby,
        Self::Faulted,
        Self::Offline,
        Self::UnderMaintenance,
        Self::Discarded,
    ];

    fn allowed_transitions(&self) -> &'static [Self] {
        use EquipmentState::*;
        match self {
            Running => &[Standby, Faulted, Offline, Discarded],
            Standby => &[Running, Faulted, Offline, Discarded],
            Offline => &[Standby, Running, Discarded],
            Faulted => &[UnderMaintenance, Discarded],
            UnderMaintenance => &[Running, Faulted, Discarded],
            Discarded => &[],
        }
    }

    fn allowed_operations(&self) -> &'static [EquipmentOperation] {
        use EquipmentOperation::*;
        match self {
            Self::Running | Self::Standby => &[TakeOffline, Discard],
            Self::Offline => &[PowerOn, BringOnline, Discard],
            Self::Faulted => &[CreateRepairOrder, Discard],
            Self::UnderMaintenance => &[CompleteRepair, Discard],
            Self::Discarded => &[],
        }
    }

    shared_registry!(EquipmentState);
}

impl EquipmentType {
    /// Category-specific operations for a powered state.
    pub fn operations_for(&self, state: EquipmentState) -> &'static [EquipmentOperation] {
        use EquipmentOperation::*;
        match (self, state) {
            (Self::AirConditioner, EquipmentState::Running) => {
                &[PowerOff, CoolMode, HeatMode, SetTemperature, EmergencyStop]
            }
            (Self::Lighting, EquipmentState::Running) => &[PowerOff, AdjustBrightness, EmergencyStop],
            (Self::Elevator, EquipmentState::Running) => {
                &[PowerOff, MoveToFloor, OpenDoor, CloseDoor, EmergencyStop]
            }
            (_, EquipmentState::Standby) => &[PowerOn, EmergencyStop],
            _ => &[],
        }
    }
}

impl fmt::Display for EquipmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Standby => write!(f, "standby"),
            Self::Faulted => write!(f, "faulted"),
            Self::Offline => write!(f, "offline"),
            Self::UnderMaintenance => write!(f, "under_maintenance"),
            Self::Discarded => write!(f, "discarded"),
        }
    }
}

impl std::str::FromStr for EquipmentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "standby" => Ok(Self::Standby),
            "faulted" => Ok(Self::Faulted),
            "offline" => Ok(Self::Offline),
            "under_maintenance" => Ok(Self::UnderMaintenance),
            "discarded" => Ok(Self::Discarded),
            _ => Err(format!("Invalid equipment state: {s}")),
        }
    }
}

impl fmt::Display for EquipmentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PowerOn => "power_on",
            Self::PowerOff => "power_off",
            Self::CoolMode => "cool_mode",
            Self::HeatMode => "heat_mode",
            Self::SetTemperature => "set_temperature",
            Self::AdjustBrightness => "adjust_brightness",
            Self::MoveToFloor => "move_to_floor",
            Self::OpenDoor => "open_door",
            Self::CloseDoor => "close_door",
            Self::EmergencyStop => "emergency_stop",
            Self::TakeOffline => "take_offline",
            Self::BringOnline => "bring_online",
            Self::CreateRepairOrder => "create_repair_order",
            Self::CompleteRepair => "complete_repair",
            Self::Discard => "discard",
        };
        f.write_str(name)
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AirConditioner => write!(f, "air_conditioner"),
            Self::Lighting => write!(f, "lighting"),
            Self::Elevator => write!(f, "elevator"),
        }
    }
}

impl std::str::FromStr for EquipmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "air_conditioner" => Ok(Self::AirConditioner),
            "lighting" => Ok(Self::Lighting),
            "elevator" => Ok(Self::Elevator),
            _ => Err(format!("Invalid equipment type: {s}")),
        }
    }
}

/// Arguments for setting operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationArgs {
    pub temperature: Option<f64>,
    pub brightness: Option<u8>,
    pub floor: Option<i32>,
    pub repair_successful: Option<bool>,
}

/// Outcome of an equipment operation.
///
/// A rejected operation is a normal result, not an error: `success` is false and
/// the state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    pub status_changed: bool,
    pub previous_state: EquipmentState,
    pub current_state: EquipmentState,
}

impl OperationResult {
    fn rejected(state: EquipmentState, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            status_changed: false,
            previous_state: state,
            current_state: state,
        }
    }

    fn applied(state: EquipmentState, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            status_changed: false,
            previous_state: state,
            current_state: state,
        }
    }

    fn changed(from: EquipmentState, to: EquipmentState, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            status_changed: true,
            previous_state: from,
            current_state: to,
        }
    }
}

/// Lifecycle context for one piece of equipment
#[derive(Debug, Clone)]
pub struct EquipmentContext {
    equipment_type: EquipmentType,
    limits: EquipmentConfig,
    inner: StateContext<EquipmentState>,
}

impl EquipmentContext {
    pub fn new(
        equipment_id: i64,
        equipment_type: EquipmentType,
        state: EquipmentState,
    ) -> StateMachineResult<Self> {
        Ok(Self {
            equipment_type,
            limits: EquipmentConfig::default(),
            inner: StateContext::new(equipment_id, state)?,
        })
    }

    pub fn from_persisted(
        equipment_id: i64,
        equipment_type: EquipmentType,
        status: &str,
    ) -> StateMachineResult<Self> {
        Ok(Self {
            equipment_type,
            limits: EquipmentConfig::default(),
            inner: StateContext::from_persisted(equipment_id, status)?,
        })
    }

    /// Use configured argument bounds instead of the defaults.
    pub fn with_limits(mut self, limits: EquipmentConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn equipment_id(&self) -> i64 {
        self.inner.entity_id()
    }

    pub fn equipment_type(&self) -> EquipmentType {
        self.equipment_type
    }

    pub fn current_state(&self) -> EquipmentState {
        self.inner.current_state()
    }

    pub fn state_context(&self) -> &StateContext<EquipmentState> {
        &self.inner
    }

    pub fn state_context_mut(&mut self) -> &mut StateContext<EquipmentState> {
        &mut self.inner
    }

    /// Every operation permitted right now, category-specific ones first.
    pub fn allowed_operations(&self) -> Vec<EquipmentOperation> {
        let state = self.current_state();
        self.equipment_type
            .operations_for(state)
            .iter()
            .chain(state.allowed_operations())
            .copied()
            .collect()
    }

    pub fn can_perform_operation(&self, operation: EquipmentOperation) -> bool {
        self.equipment_type
            .operations_for(self.current_state())
            .contains(&operation)
            || self.inner.can_perform_operation(operation)
    }

    /// Only a faulted unit can have a repair order opened against it.
    pub fn can_create_repair_order(&self) -> bool {
        self.current_state() == EquipmentState::Faulted
    }

    /// Execute `operation` against the current state.
    pub fn perform_operation(
        &mut self,
        operation: EquipmentOperation,
        args: &OperationArgs,
    ) -> StateMachineResult<OperationResult> {
        let state = self.current_state();

        if state == EquipmentState::Discarded {
            return Ok(OperationResult::rejected(
                state,
                format!("Equipment {} is discarded; {operation} refused", self.equipment_id()),
            ));
        }

        if operation == EquipmentOperation::EmergencyStop {
            return self.emergency_stop();
        }

        if !self.can_perform_operation(operation) {
            return Ok(OperationResult::rejected(
                state,
                format!(
                    "{operation} is not available for {} in state {state}",
                    self.equipment_type
                ),
            ));
        }

        use EquipmentOperation::*;
        match operation {
            PowerOn => self.move_to(EquipmentState::Running, "powered on"),
            PowerOff => self.move_to(EquipmentState::Standby, "powered off"),
            TakeOffline => self.move_to(EquipmentState::Offline, "taken offline"),
            BringOnline => self.move_to(EquipmentState::Standby, "brought online"),
            Discard => self.move_to(EquipmentState::Discarded, "discarded"),
            CreateRepairOrder => self.create_repair_order(),
            CompleteRepair => match args.repair_successful {
                Some(success) => self.complete_repair(success),
                None => Err(invalid_argument(operation, "a repair outcome is required")),
            },
            CoolMode => Ok(OperationResult::applied(state, "Cooling mode engaged")),
            HeatMode => Ok(OperationResult::applied(state, "Heating mode engaged")),
            SetTemperature => self.set_temperature(args.temperature),
            AdjustBrightness => self.adjust_brightness(args.brightness),
            MoveToFloor => self.move_to_floor(args.floor),
            OpenDoor => Ok(OperationResult::applied(state, "Doors opened")),
            CloseDoor => Ok(OperationResult::applied(state, "Doors closed")),
            EmergencyStop => self.emergency_stop(),
        }
    }

    /// Faulted -> UnderMaintenance once a repair order is opened.
    pub fn create_repair_order(&mut self) -> StateMachineResult<OperationResult> {
        let state = self.current_state();
        if !self.can_create_repair_order() {
            return Ok(OperationResult::rejected(
                state,
                format!("Repair orders can only be opened for faulted equipment (currently {state})"),
            ));
        }
        self.move_to(EquipmentState::UnderMaintenance, "repair order opened")
    }

    /// Close maintenance with the technician's verdict.
    pub fn complete_repair(&mut self, success: bool) -> StateMachineResult<OperationResult> {
        let state = self.current_state();
        if state != EquipmentState::UnderMaintenance {
            return Ok(OperationResult::rejected(
                state,
                format!("Equipment is not under maintenance (currently {state})"),
            ));
        }
        if success {
            self.move_to(EquipmentState::Running, "repair completed")
        } else {
            self.move_to(EquipmentState::Faulted, "repair failed")
        }
    }

    fn emergency_stop(&mut self) -> StateMachineResult<OperationResult> {
        let state = self.current_state();
        if !state.is_powered() {
            return Ok(OperationResult::rejected(
                state,
                format!("Emergency stop has no effect in state {state}"),
            ));
        }
        self.move_to(EquipmentState::Faulted, "emergency stop")
    }

    fn move_to(
        &mut self,
        target: EquipmentState,
        reason: &str,
    ) -> StateMachineResult<OperationResult> {
        let record = self.inner.transition_to_state(target, reason)?;
        Ok(OperationResult::changed(
            record.from_state,
            record.to_state,
            format!("Equipment {}: {reason}", self.equipment_id()),
        ))
    }

    fn set_temperature(&self, temperature: Option<f64>) -> StateMachineResult<OperationResult> {
        let operation = EquipmentOperation::SetTemperature;
        let value =
            temperature.ok_or_else(|| invalid_argument(operation, "a temperature is required"))?;
        let (min, max) = (self.limits.min_temperature_c, self.limits.max_temperature_c);
        if !(min..=max).contains(&value) {
            return Err(invalid_argument(
                operation,
                format!("temperature {value}°C outside allowed range {min}-{max}°C"),
            ));
        }
        Ok(OperationResult::applied(
            self.current_state(),
            format!("Temperature set to {value}°C"),
        ))
    }

    fn adjust_brightness(&self, brightness: Option<u8>) -> StateMachineResult<OperationResult> {
        let operation = EquipmentOperation::AdjustBrightness;
        let level =
            brightness.ok_or_else(|| invalid_argument(operation, "a brightness level is required"))?;
        if level > self.limits.max_brightness {
            return Err(invalid_argument(
                operation,
                format!(
                    "brightness {level} exceeds maximum {}",
                    self.limits.max_brightness
                ),
            ));
        }
        Ok(OperationResult::applied(
            self.current_state(),
            format!("Brightness set to {level}%"),
        ))
    }

    fn move_to_floor(&self, floor: Option<i32>) -> StateMachineResult<OperationResult> {
        let operation = EquipmentOperation::MoveToFloor;
        let level = floor.ok_or_else(|| invalid_argument(operation, "a floor is required"))?;
        let (min, max) = (self.limits.min_floor, self.limits.max_floor);
        if level == 0 {
            return Err(invalid_argument(operation, "there is no floor 0"));
        }
        if !(min..=max).contains(&level) {
            return Err(invalid_argument(
                operation,
                format!("floor {level} outside served range {min}..{max}"),
            ));
        }
        Ok(OperationResult::applied(
            self.current_state(),
            format!("Moving to floor {level}"),
        ))
    }
}
