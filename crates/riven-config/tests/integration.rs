use riven_config::{ConfigService, default_settings};
use std::io::Write;

#[test]
fn config_service_loads_file_and_reports_profile_for_path() {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "riven-config-integration-{}.toml",
        std::process::id()
    ));
    let mut file = std::fs::File::create(&path).expect("create fixture file");
    write!(
        file,
        r#"
        default_profile = "default"
        mount_path = "/mnt/riven"

        [[ranking_profiles]]
        name = "default"
        bucket_limit = 50
        keep_versions_per_item = 1

        [[ranking_profiles]]
        name = "anime"
        bucket_limit = 20
        keep_versions_per_item = 1

        [[path_profiles]]
        path = "/library/anime"
        profile = "anime"
        "#
    )
    .expect("write fixture file");
    drop(file);

    let service = ConfigService::load(Some(path.clone()), &default_settings()).expect("loads");
    let snapshot = service.current();
    assert_eq!(snapshot.profile_for_path("/library/anime/one-piece"), "anime");
    assert_eq!(snapshot.profile_for_path("/library/movies/inception"), "default");

    let _ = std::fs::remove_file(&path);
}
