use carelog_config::CareConfig;
use figment::Jail;

#[test]
fn env_vars_fill_nested_sections() {
    Jail::expect_with(|jail| {
        jail.set_env("CARELOG_BACKEND__URL", "https://env.example.org");
        jail.set_env("CARELOG_BACKEND__ANON_KEY", "anon-from-env");
        jail.set_env("CARELOG_AUTH__EMAIL_DOMAIN", "env.example");

        let config = CareConfig::load().expect("config loads");
        assert_eq!(config.backend.url, "https://env.example.org");
        assert_eq!(config.backend.anon_key, "anon-from-env");
        assert_eq!(config.auth.email_domain, "env.example");
        Ok(())
    });
}

#[test]
fn env_beats_project_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir(".carelog")?;
        jail.create_file(
            ".carelog/config.toml",
            r#"
[backend]
url = "https://toml.example.org"
anon_key = "toml-key"
"#,
        )?;
        jail.set_env("CARELOG_BACKEND__URL", "https://env.example.org");

        let config = CareConfig::load().expect("config loads");
        assert_eq!(config.backend.url, "https://env.example.org");
        assert_eq!(config.backend.anon_key, "toml-key");
        Ok(())
    });
}
