use super::validation::validate_config;
use super::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn create_test_config(latitude: f64, longitude: f64, offset: Option<i64>) -> Config {
    Config {
        latitude: Some(latitude),
        longitude: Some(longitude),
        offset,
        mqtt: None,
    }
}

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join(CONFIG_FILE_NAME);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_config_validation_basic() {
    assert!(validate_config(&create_test_config(40.0, -105.0, None)).is_ok());
    assert!(validate_config(&create_test_config(-33.9, 151.2, Some(0))).is_ok());
    assert!(validate_config(&create_test_config(90.0, 180.0, Some(360))).is_ok());
}

#[test]
fn test_config_validation_requires_coordinates() {
    let mut config = create_test_config(40.0, -105.0, None);
    config.latitude = None;
    assert!(validate_config(&config).is_err());

    let mut config = create_test_config(40.0, -105.0, None);
    config.longitude = None;
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_coordinate_ranges() {
    assert!(validate_config(&create_test_config(90.1, 0.0, None)).is_err());
    assert!(validate_config(&create_test_config(-91.0, 0.0, None)).is_err());
    assert!(validate_config(&create_test_config(0.0, 180.5, None)).is_err());
    assert!(validate_config(&create_test_config(f64::NAN, 0.0, None)).is_err());
}

#[test]
fn test_config_validation_offset_range() {
    let err = validate_config(&create_test_config(40.0, -105.0, Some(-1))).unwrap_err();
    assert!(err.to_string().contains("offset"));
    assert!(validate_config(&create_test_config(40.0, -105.0, Some(361))).is_err());
}

#[test]
fn test_config_validation_mqtt() {
    let with_mqtt = |mqtt: MqttConfig| Config {
        mqtt: Some(mqtt),
        ..create_test_config(40.0, -105.0, None)
    };

    assert!(validate_config(&with_mqtt(MqttConfig::default())).is_ok());
    assert!(
        validate_config(&with_mqtt(MqttConfig {
            port: Some(0),
            ..Default::default()
        }))
        .is_err()
    );
    assert!(
        validate_config(&with_mqtt(MqttConfig {
            host: Some("  ".to_string()),
            ..Default::default()
        }))
        .is_err()
    );
    assert!(
        validate_config(&with_mqtt(MqttConfig {
            pass: Some("secret".to_string()),
            ..Default::default()
        }))
        .is_err()
    );
    assert!(
        validate_config(&with_mqtt(MqttConfig {
            user: Some("casa".to_string()),
            pass: Some("secret".to_string()),
            ..Default::default()
        }))
        .is_ok()
    );
}

#[test]
fn test_defaults_applied() {
    let config = create_test_config(40.0, -105.0, None);
    assert_eq!(config.offset_minutes(), DEFAULT_OFFSET_MINUTES);
    assert_eq!(config.offset(), Duration::minutes(60));

    let mqtt = config.mqtt();
    assert_eq!(mqtt.host, DEFAULT_MQTT_HOST);
    assert_eq!(mqtt.port, DEFAULT_MQTT_PORT);
    assert_eq!(mqtt.client_id, DEFAULT_MQTT_CLIENT_ID);
    assert_eq!(mqtt.user, None);

    let location = config.location().unwrap();
    assert_eq!(location.latitude, 40.0);
    assert_eq!(location.longitude, -105.0);
}

#[test]
fn test_load_from_path_full_file() {
    let temp_dir = tempdir().unwrap();
    let path = write_config(
        temp_dir.path(),
        r#"
latitude = 40.0
longitude = -105.0
offset = 45

[mqtt]
host = "broker.local"
port = 8883
user = "casa"
pass = "secret"
client_id = "daytime-test"
"#,
    );

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.offset(), Duration::minutes(45));
    assert_eq!(
        config.mqtt(),
        MqttSettings {
            host: "broker.local".to_string(),
            port: 8883,
            user: Some("casa".to_string()),
            pass: Some("secret".to_string()),
            client_id: "daytime-test".to_string(),
        }
    );
}

#[test]
fn test_load_from_path_minimal_file() {
    let temp_dir = tempdir().unwrap();
    let path = write_config(temp_dir.path(), "latitude = 51.5\nlongitude = -0.13\n");

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.offset_minutes(), 60);
    assert_eq!(config.mqtt().port, 1883);
}

#[test]
fn test_load_from_path_rejects_invalid_values() {
    let temp_dir = tempdir().unwrap();
    let path = write_config(
        temp_dir.path(),
        "latitude = 40.0\nlongitude = -105.0\noffset = 500\n",
    );

    let err = load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("offset"));
}

#[test]
fn test_load_from_path_rejects_malformed_toml() {
    let temp_dir = tempdir().unwrap();
    let path = write_config(temp_dir.path(), "latitude = \"north\"\n");
    assert!(load_from_path(&path).is_err());

    let path = write_config(temp_dir.path(), "latitude = 1\nlongitude = 2\n[mqtt]\nport = 70000\n");
    assert!(load_from_path(&path).is_err());
}

#[test]
fn test_load_from_path_missing_file() {
    let temp_dir = tempdir().unwrap();
    let err = load_from_path(&temp_dir.path().join(CONFIG_FILE_NAME)).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_config_load_uses_xdg_config_home() {
    let temp_dir = tempdir().unwrap();
    let config_dir = temp_dir.path().join(CONFIG_DIR_NAME);
    fs::create_dir_all(&config_dir).unwrap();
    write_config(&config_dir, "latitude = 10.0\nlongitude = 20.0\n");

    // Save and restore XDG_CONFIG_HOME
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert_eq!(config.latitude, Some(10.0));
    assert_eq!(config.longitude, Some(20.0));
}
