use dockhand::naming::repo_name;
use dockhand::{DeployedUnit, DeploymentConfig, NginxSite};

fn unit(url: &str, port: u16) -> DeployedUnit {
    let config = DeploymentConfig::new(url, "ubuntu", "203.0.113.10", "/k", port);
    DeployedUnit::derive(&config).unwrap()
}

#[test]
fn git_urls_map_to_lowercased_basename() {
    let cases = [
        ("https://github.com/acme/Shop-App.git", "shop-app"),
        ("https://gitlab.example.com/team/sub/Billing.git", "billing"),
        ("https://host/owner/already-lower.git", "already-lower"),
        ("git@github.com:Acme/Inventory_API.git", "inventory_api"),
        ("https://host/owner/v2.service.git", "v2.service"),
    ];

    for (url, expected) in cases {
        assert_eq!(repo_name(url).unwrap(), expected, "{url}");
    }
}

#[test]
fn shop_app_example() {
    let unit = unit("https://github.com/acme/Shop-App.git", 3000);
    let block = NginxSite::for_unit(&unit).render();

    assert_eq!(unit.name, "shop-app");
    assert!(block.contains("server_name _;"));
    assert!(block.contains("location / {"));
    assert!(block.contains("proxy_pass http://localhost:3000;"));
}

#[test]
fn identifiers_are_stable_across_runs() {
    let first = unit("https://github.com/acme/Shop-App.git", 8080);
    let second = unit("https://github.com/acme/Shop-App.git", 8080);

    assert_eq!(first, second);
    assert_eq!(
        NginxSite::for_unit(&first).render(),
        NginxSite::for_unit(&second).render()
    );
}

#[test]
fn traversal_in_url_is_rejected() {
    for url in [
        "https://host/owner/..",
        "https://host/owner/../",
        "https://host/owner/;rm -rf ~.git",
        "https://host/owner/$(whoami).git",
    ] {
        assert!(repo_name(url).is_err(), "{url}");
    }
}
