// End-to-end tests against a real 0.31 production save.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use zs_core::codec::{self, Decimal, Value};
use zs_core::golden::{GoldenStore, StructuralValidator, TypedSchemaValidator};
use zs_core::io::atomic_write;
use zs_core::model::{Item, ModelError, SaveData};
use zs_core::{BackupManager, GoldenError, SaveError, SaveManager, SaveValidator};

const FIXTURE: &str = include_str!("fixtures/save_0_31_production.dat");

fn install_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("save_shared_1.dat");
    fs::write(&path, FIXTURE).unwrap();
    path
}

fn manager(dir: &Path) -> SaveManager {
    let save_path = install_fixture(dir);
    SaveManager::new(save_path, BackupManager::new(dir.join("backup"), 10))
}

fn backup_count(dir: &Path) -> usize {
    match fs::read_dir(dir.join("backup")) {
        Ok(entries) => entries.count(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
        Err(err) => panic!("{err}"),
    }
}

#[test]
fn test_fixture_reencodes_byte_identically() {
    let save = codec::from_str(FIXTURE).unwrap();
    assert_eq!(codec::to_string(&save), FIXTURE);
}

#[test]
fn test_fixture_passes_both_validators() {
    let mut save = codec::from_str(FIXTURE).unwrap();

    TypedSchemaValidator::new(GoldenStore::Bundled)
        .validate(&mut save)
        .unwrap();
    StructuralValidator::new(GoldenStore::Bundled)
        .validate(&mut save)
        .unwrap();

    // Structural validation empties the inventory and chests while comparing.
    assert_eq!(codec::to_string(&save), FIXTURE);
}

#[test]
fn test_structural_failure_restores_player_content() {
    let mut save = codec::from_str(FIXTURE).unwrap();
    save.as_object_mut().unwrap().remove("format");

    let err = StructuralValidator::new(GoldenStore::Bundled)
        .validate(&mut save)
        .unwrap_err();
    assert!(matches!(err, GoldenError::Mismatch(_)));

    let items = save
        .pointer(&["data", "pre_raid", "Inventory", "items"])
        .and_then(Value::as_array)
        .unwrap();
    assert_eq!(items.len(), 3);
    let chest_0 = save
        .pointer(&["data", "chest", "chest_0"])
        .and_then(Value::as_array)
        .unwrap();
    assert_eq!(chest_0.len(), 2);
}

#[test]
fn test_typed_validation_names_the_mistyped_field() {
    let mut save = codec::from_str(FIXTURE).unwrap();
    save.pointer_mut(&["data", "pre_raid", "player"])
        .and_then(Value::as_object_mut)
        .unwrap()
        .insert("hp", Value::from("full"));

    let err = TypedSchemaValidator::new(GoldenStore::Bundled)
        .validate(&mut save)
        .unwrap_err();
    let GoldenError::Mismatch(report) = err else {
        panic!("expected a mismatch, got {err:?}");
    };
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].path, "data.pre_raid.player.hp");
    assert_eq!(report.violations[0].message, "expected decimal, found string");
}

#[test]
fn test_edit_hp_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager(temp_dir.path());

    let mut save = manager.load().unwrap();
    let mut data = SaveData::new(&save).unwrap();
    assert_eq!(data.player.stats.hp.to_string(), "120.0");
    data.player.stats.hp = "80.0".parse().unwrap();
    data.apply(&mut save).unwrap();
    manager.write(&mut save).unwrap();

    let written = fs::read_to_string(manager.save_path()).unwrap();
    assert_eq!(
        written,
        FIXTURE.replace("\"hp\": 120.0", "\"hp\": 80.0")
    );

    let reloaded = SaveData::new(&manager.load().unwrap()).unwrap();
    assert_eq!(reloaded.player.stats.hp, "80.0".parse::<Decimal>().unwrap());
    assert_eq!(reloaded.player.stats.thirst.to_string(), "90.0");
    assert_eq!(reloaded.player.stats.radiation.to_string(), "0.000015");

    // The pre-edit file was backed up first.
    let backups = manager.backups().backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), FIXTURE);
}

#[test]
fn test_item_views_survive_a_get_set_cycle() {
    let mut save = codec::from_str(FIXTURE).unwrap();
    let data = SaveData::new(&save).unwrap();

    let ak74 = &data.player.inventory[0];
    assert_eq!(ak74.name, "ak74");
    assert_eq!(ak74.quantity, 1);
    let weapon = ak74.weapon.as_ref().unwrap();
    assert_eq!(weapon.ammo_quantity, 30);
    assert!(ak74.extra("mods").is_some());

    data.apply(&mut save).unwrap();
    assert_eq!(codec::to_string(&save), FIXTURE);
}

#[test]
fn test_move_item_between_chests() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager(temp_dir.path());

    let mut save = manager.load().unwrap();
    let mut data = SaveData::new(&save).unwrap();
    assert_eq!(data.storage.chests.len(), 14);

    let canned_meat = data.storage.chest_mut(0).unwrap().items.remove(1);
    data.storage.chest_mut(5).unwrap().items.push(canned_meat);
    data.storage
        .chest_mut(5)
        .unwrap()
        .items
        .push(Item::new("water", 2));
    data.apply(&mut save).unwrap();
    manager.write(&mut save).unwrap();

    let reloaded = SaveData::new(&manager.load().unwrap()).unwrap();
    assert_eq!(reloaded.storage.chest(0).unwrap().items.len(), 1);
    let chest_5 = &reloaded.storage.chest(5).unwrap().items;
    assert_eq!(chest_5.len(), 2);
    assert_eq!(chest_5[0].name, "canned_meat");
    assert_eq!(
        chest_5[0].generated.as_ref().unwrap().durability.to_string(),
        "97.632510444442118568986188620329"
    );
    assert_eq!(chest_5[1].name, "water");
    assert_eq!(chest_5[1].quantity, 2);

    let written = fs::read_to_string(manager.save_path()).unwrap();
    assert!(written.contains("\"item\": \"water\", \"x\": 0.0, \"y\": 0.0, \"quantity\": 2.0"));
}

#[test]
fn test_backup_retention_evicts_oldest_modified() {
    let temp_dir = TempDir::new().unwrap();
    let save_path = install_fixture(temp_dir.path());
    let backups = BackupManager::new(temp_dir.path().join("backup"), 10);
    let base = SystemTime::now() - Duration::from_secs(24 * 3600);

    let made: Vec<PathBuf> = (0..10)
        .map(|i| backups.backup(&save_path, Some(&format!("run{i:02}"))).unwrap())
        .collect();
    // Modification order runs opposite to creation and name order, so
    // run09 is the oldest backup.
    for (i, path) in made.iter().enumerate() {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(base + Duration::from_secs(60 * (10 - i as u64)))
            .unwrap();
    }

    let newest = backups.backup(&save_path, Some("run10")).unwrap();

    let remaining = backups.backups().unwrap();
    assert_eq!(remaining.len(), 10);
    assert!(!made[9].exists());
    let mut expected: Vec<PathBuf> = made[..9].iter().rev().cloned().collect();
    expected.push(newest);
    assert_eq!(remaining, expected);
}

#[test]
fn test_failed_encode_leaves_original_and_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let save_path = install_fixture(temp_dir.path());

    let result = atomic_write(&save_path, |out| {
        out.write_all(b"{ \"save_version\": ")?;
        Err(io::Error::new(io::ErrorKind::Other, "interrupted"))
    });

    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&save_path).unwrap(), FIXTURE);
    let names: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec!["save_shared_1.dat"]);
}

#[test]
fn test_invalid_save_is_rejected_before_backup() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager(temp_dir.path());

    let mut save = manager.load().unwrap();
    save.pointer_mut(&["data", "pre_raid", "player"])
        .and_then(Value::as_object_mut)
        .unwrap()
        .remove("thirst");

    let err = manager.write(&mut save).unwrap_err();
    assert!(matches!(err, SaveError::NotFormatted(_)));
    assert!(err.to_string().starts_with("Save not formatted properly"));
    assert_eq!(backup_count(temp_dir.path()), 0);
    assert_eq!(fs::read_to_string(manager.save_path()).unwrap(), FIXTURE);
}

#[test]
fn test_unknown_version() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager(temp_dir.path());

    let mut save = manager.load().unwrap();
    save.as_object_mut()
        .unwrap()
        .insert("save_version", Value::from("0.40 production"));

    assert_eq!(
        SaveData::new(&save).err(),
        Some(ModelError::UnsupportedVersion {
            version: "0.40 production".to_string()
        })
    );

    let err = manager.write(&mut save).unwrap_err();
    assert!(matches!(
        err,
        SaveError::IntegritySetup(GoldenError::NotFound { .. })
    ));
    assert_eq!(backup_count(temp_dir.path()), 0);
}

#[test]
fn test_missing_version() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager(temp_dir.path());

    let mut save = manager.load().unwrap();
    save.as_object_mut().unwrap().remove("save_version");

    assert!(matches!(
        SaveData::new(&save).err(),
        Some(ModelError::InvalidSave { .. })
    ));
    assert!(matches!(
        manager.write(&mut save),
        Err(SaveError::MissingVersion)
    ));
    assert_eq!(fs::read_to_string(manager.save_path()).unwrap(), FIXTURE);
}
