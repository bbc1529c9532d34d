//! Board pin registry tests.
//!
//! Reference mapping for every supported board, lookup stability, and the
//! hard failure for unknown boards.

use multibutton_common::board::registry::{
    BOARD_RPI3, BoardProfile, PinTable, RegistryError, pin_for, supported_boards,
};
use multibutton_common::board::role::PinRole;

#[test]
fn rpi3_reference_mapping() {
    let expected = [
        (PinRole::Led1, "BCM6"),
        (PinRole::Led2, "BCM19"),
        (PinRole::Led3, "BCM26"),
        (PinRole::Button1, "BCM21"),
        (PinRole::Button2, "BCM20"),
        (PinRole::Button3, "BCM16"),
    ];
    for (role, pin) in expected {
        assert_eq!(pin_for(BOARD_RPI3, role).unwrap(), pin, "role {role}");
    }
}

#[test]
fn every_supported_board_is_total_and_stable() {
    let table = PinTable::builtin();
    let boards: Vec<&str> = supported_boards().collect();
    assert_eq!(boards.len(), 3);

    for board in boards {
        let profile = BoardProfile::new(board);
        for role in PinRole::ALL {
            let first = pin_for(board, role).unwrap();
            let second = pin_for(board, role).unwrap();
            assert!(!first.is_empty(), "{board}/{role} is empty");
            assert_eq!(first, second);

            let resolved = table.resolve(&profile, role).unwrap();
            assert_eq!(resolved, table.resolve(&profile, role).unwrap());
            assert_eq!(resolved.pin(), first);
            assert_eq!(resolved.role(), role);
        }
    }
}

#[test]
fn unsupported_board_fails_for_every_role() {
    let table = PinTable::builtin();
    let profile = BoardProfile::new("edison_arduino");

    for role in PinRole::ALL {
        assert!(matches!(
            pin_for("edison_arduino", role),
            Err(RegistryError::UnsupportedBoard { ref board }) if board == "edison_arduino"
        ));
        assert!(matches!(
            table.resolve(&profile, role),
            Err(RegistryError::UnsupportedBoard { .. })
        ));
    }
    assert!(table.resolve_all(&profile).is_err());
}

#[test]
fn board_ids_are_exact_matches() {
    assert!(pin_for("RPI3", PinRole::Led1).is_err());
    assert!(pin_for(" rpi3", PinRole::Led1).is_err());
    assert!(pin_for("", PinRole::Led1).is_err());
}

#[test]
fn pin_table_file_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boards.toml");
    std::fs::write(
        &path,
        r#"
[boards.bench]
Led1 = "SIM_L1"
Led2 = "SIM_L2"
Led3 = "SIM_L3"
Button1 = "SIM_B1"
Button2 = "SIM_B2"
Button3 = "SIM_B3"
"#,
    )
    .unwrap();

    let table = PinTable::builtin().merge(PinTable::load(&path).unwrap());
    let bench = BoardProfile::new("bench");
    assert_eq!(table.resolve(&bench, PinRole::Button2).unwrap().pin(), "SIM_B2");
    assert_eq!(
        table
            .resolve(&BoardProfile::new(BOARD_RPI3), PinRole::Led3)
            .unwrap()
            .pin(),
        "BCM26"
    );
}

#[test]
fn pin_table_missing_file() {
    let err = PinTable::load(std::path::Path::new("/nonexistent/boards.toml")).unwrap_err();
    assert!(matches!(err, RegistryError::Parse(_)));
}

#[test]
fn pin_table_rejects_role_named_twice() {
    let err = PinTable::from_toml(
        r#"
[boards.x]
Led1 = "P1"
led1 = "P9"
Led2 = "P2"
Led3 = "P3"
Button1 = "P4"
Button2 = "P5"
Button3 = "P6"
"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateRole {
            board: "x".to_string(),
            role: PinRole::Led1,
        }
    );
}
