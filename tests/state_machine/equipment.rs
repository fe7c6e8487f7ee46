use premises_core::config::EquipmentConfig;
use premises_core::state_machine::{
    EquipmentContext, EquipmentOperation, EquipmentState, EquipmentType, OperationArgs,
    StateMachineError,
};

fn context(equipment_type: EquipmentType, state: EquipmentState) -> EquipmentContext {
    EquipmentContext::new(100, equipment_type, state).unwrap()
}

#[test]
fn test_emergency_stop_from_powered_states() {
    for equipment_type in [
        EquipmentType::AirConditioner,
        EquipmentType::Lighting,
        EquipmentType::Elevator,
    ] {
        for state in [EquipmentState::Running, EquipmentState::Standby] {
            let mut equipment = context(equipment_type, state);
            let result = equipment
                .perform_operation(EquipmentOperation::EmergencyStop, &OperationArgs::default())
                .unwrap();
            assert!(result.success, "{equipment_type} in {state}");
            assert!(result.status_changed);
            assert_eq!(result.current_state, EquipmentState::Faulted);
            assert_eq!(equipment.current_state(), EquipmentState::Faulted);
        }
    }
}

#[test]
fn test_emergency_stop_ignored_when_unpowered() {
    for state in [
        EquipmentState::Offline,
        EquipmentState::Faulted,
        EquipmentState::UnderMaintenance,
    ] {
        let mut equipment = context(EquipmentType::Elevator, state);
        let result = equipment
            .perform_operation(EquipmentOperation::EmergencyStop, &OperationArgs::default())
            .unwrap();
        assert!(!result.success);
        assert!(!result.status_changed);
        assert_eq!(equipment.current_state(), state);
    }
}

#[test]
fn test_discarded_refuses_every_operation() {
    let operations = [
        EquipmentOperation::PowerOn,
        EquipmentOperation::PowerOff,
        EquipmentOperation::EmergencyStop,
        EquipmentOperation::CreateRepairOrder,
        EquipmentOperation::Discard,
        EquipmentOperation::SetTemperature,
    ];
    let mut equipment = context(EquipmentType::AirConditioner, EquipmentState::Discarded);
    assert!(equipment.allowed_operations().is_empty());
    for operation in operations {
        let result = equipment
            .perform_operation(operation, &OperationArgs::default())
            .unwrap();
        assert!(!result.success, "{operation} accepted while discarded");
        assert_eq!(equipment.current_state(), EquipmentState::Discarded);
    }
    assert!(equipment.state_context().history().is_empty());
}

#[test]
fn test_vocabulary_is_per_type() {
    let air = context(EquipmentType::AirConditioner, EquipmentState::Running);
    assert!(air.can_perform_operation(EquipmentOperation::CoolMode));
    assert!(!air.can_perform_operation(EquipmentOperation::MoveToFloor));

    let mut lift = context(EquipmentType::Elevator, EquipmentState::Running);
    assert!(lift.can_perform_operation(EquipmentOperation::OpenDoor));
    let result = lift
        .perform_operation(EquipmentOperation::HeatMode, &OperationArgs::default())
        .unwrap();
    assert!(!result.success);

    let standby = context(EquipmentType::Lighting, EquipmentState::Standby);
    assert!(standby.can_perform_operation(EquipmentOperation::PowerOn));
    assert!(!standby.can_perform_operation(EquipmentOperation::AdjustBrightness));
}

#[test]
fn test_repair_cycle() {
    let mut equipment = context(EquipmentType::AirConditioner, EquipmentState::Running);
    assert!(!equipment.can_create_repair_order());

    equipment
        .perform_operation(EquipmentOperation::EmergencyStop, &OperationArgs::default())
        .unwrap();
    assert!(equipment.can_create_repair_order());

    let opened = equipment.create_repair_order().unwrap();
    assert!(opened.status_changed);
    assert_eq!(equipment.current_state(), EquipmentState::UnderMaintenance);
    // Only one open order: the unit is no longer faulted.
    assert!(!equipment.can_create_repair_order());
    assert!(!equipment.create_repair_order().unwrap().success);

    equipment.complete_repair(false).unwrap();
    assert_eq!(equipment.current_state(), EquipmentState::Faulted);

    equipment.create_repair_order().unwrap();
    equipment.complete_repair(true).unwrap();
    assert_eq!(equipment.current_state(), EquipmentState::Running);
    assert_eq!(equipment.state_context().history().len(), 5);
}

#[test]
fn test_setting_arguments_respect_limits() {
    let limits = EquipmentConfig {
        min_temperature_c: 18.0,
        max_temperature_c: 26.0,
        ..EquipmentConfig::default()
    };
    let mut air = context(EquipmentType::AirConditioner, EquipmentState::Running).with_limits(limits);

    let too_hot = OperationArgs {
        temperature: Some(28.0),
        ..OperationArgs::default()
    };
    let err = air
        .perform_operation(EquipmentOperation::SetTemperature, &too_hot)
        .unwrap_err();
    assert!(matches!(
        err,
        StateMachineError::InvalidOperationArgument { ref reason, .. } if reason.contains("18-26")
    ));
    assert!(err.is_business_error());

    let comfortable = OperationArgs {
        temperature: Some(22.5),
        ..OperationArgs::default()
    };
    let result = air
        .perform_operation(EquipmentOperation::SetTemperature, &comfortable)
        .unwrap();
    assert!(result.success);
    assert!(!result.status_changed);
    assert_eq!(air.current_state(), EquipmentState::Running);
}

#[test]
fn test_missing_or_out_of_range_arguments_are_errors() {
    let mut lights = context(EquipmentType::Lighting, EquipmentState::Running);
    let too_bright = OperationArgs {
        brightness: Some(150),
        ..OperationArgs::default()
    };
    assert!(matches!(
        lights.perform_operation(EquipmentOperation::AdjustBrightness, &too_bright),
        Err(StateMachineError::InvalidOperationArgument { .. })
    ));
    assert!(matches!(
        lights.perform_operation(EquipmentOperation::AdjustBrightness, &OperationArgs::default()),
        Err(StateMachineError::InvalidOperationArgument { .. })
    ));

    let mut lift = context(EquipmentType::Elevator, EquipmentState::Running);
    let basement = OperationArgs {
        floor: Some(-2),
        ..OperationArgs::default()
    };
    assert!(lift
        .perform_operation(EquipmentOperation::MoveToFloor, &basement)
        .unwrap()
        .success);
    let ground_zero = OperationArgs {
        floor: Some(0),
        ..OperationArgs::default()
    };
    assert!(matches!(
        lift.perform_operation(EquipmentOperation::MoveToFloor, &ground_zero),
        Err(StateMachineError::InvalidOperationArgument { .. })
    ));
    assert!(lift.state_context().history().is_empty());
}
