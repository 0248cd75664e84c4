//! Bootstrap and ingestion against a file-backed central database.

use stowdb_central::ingest::category_counts;
use stowdb_central::{
    Jewel, KnownTable, RawSiteData, WearableItem, bootstrap, ingest_pages, pending_wearables,
};
use stowdb_core::{Database, Filters, Patch};
use tempfile::tempdir;

fn create_test_db() -> (Database, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path().join("central.sqlite")).unwrap();
    bootstrap(&db).unwrap();
    (db, dir)
}

fn page(url: &str, category: &str) -> (String, String, String) {
    (
        url.to_string(),
        category.to_string(),
        format!("<html>{url}</html>"),
    )
}

#[test]
fn test_bootstrap_creates_every_table_and_index() {
    let (db, _dir) = create_test_db();
    assert_eq!(
        db.list_tables().unwrap(),
        vec!["jewel", "pet_ability", "raw_site_data", "wearable_item"]
    );
    for table in KnownTable::ALL {
        let indexes = db.list_indexes(table.name()).unwrap();
        assert_eq!(indexes.len(), table.indexes().len(), "{table}");
    }

    // Running it again changes nothing.
    bootstrap(&db).unwrap();
    assert_eq!(db.list_tables().unwrap().len(), 4);
}

#[test]
fn test_ingest_and_pending_wearables() {
    let (db, _dir) = create_test_db();
    let stored = db
        .transact(|s| {
            ingest_pages(
                s,
                vec![
                    page("/wiki/Item:Crown", "Hat"),
                    page("/wiki/Item:Gown", "robes"),
                    page("/wiki/Jewel:Opal", "jewels"),
                    page("/wiki/Talent:Spritely", "talents"),
                    page("/wiki/Pet:Dragon", "pets"),
                ],
            )
        })
        .unwrap();
    assert_eq!(stored, 5);

    let session = db.session().unwrap();
    let mut urls: Vec<String> = pending_wearables(&session)
        .unwrap()
        .into_iter()
        .map(|raw| raw.page_url)
        .collect();
    urls.sort();
    assert_eq!(urls, vec!["/wiki/Item:Crown", "/wiki/Item:Gown"]);

    let crown: RawSiteData = session
        .find(Filters::new().with("page_url", "/wiki/Item:Crown"))
        .unwrap();
    assert_eq!(crown.category, "hats");
    assert_eq!(crown.page_source.as_deref(), Some("<html>/wiki/Item:Crown</html>"));

    let pet: RawSiteData = session
        .find(Filters::new().with("page_url", "/wiki/Pet:Dragon"))
        .unwrap();
    assert_eq!(pet.category, "pets");

    let counts = category_counts(&session).unwrap();
    assert_eq!(
        counts,
        vec![("hats", 1), ("robes", 1), ("jewels", 1), ("talents", 1)]
    );
}

#[test]
fn test_reingest_replaces_page() {
    let (db, _dir) = create_test_db();
    db.transact(|s| ingest_pages(s, vec![page("/wiki/Item:Crown", "hats")]))
        .unwrap();
    db.transact(|s| {
        ingest_pages(
            s,
            vec![(
                "/wiki/Item:Crown".to_string(),
                "hats".to_string(),
                "<html>v2</html>".to_string(),
            )],
        )
    })
    .unwrap();

    let session = db.session().unwrap();
    let all = session.all::<RawSiteData>().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].page_source.as_deref(), Some("<html>v2</html>"));
}

#[test]
fn test_parsed_records_persist_with_stats() {
    let (db, _dir) = create_test_db();
    let mut item = WearableItem {
        page_url: "/wiki/Item:Crown".into(),
        name: "Crown".into(),
        category: "hats".into(),
        ..Default::default()
    };
    item.stats.damage_percent.fire = 12.0;
    item.stats.health = 250.0;

    let jewel = Jewel {
        page_url: "/wiki/Jewel:Opal".into(),
        name: "Opal".into(),
        shape: "circle".into(),
        ..Default::default()
    };

    db.transact(|s| {
        s.save(&item)?;
        s.save(&jewel)
    })
    .unwrap();

    let session = db.session().unwrap();
    let found: WearableItem = session
        .find(Filters::new().with("stats_damage_percent_fire__not", 0.0))
        .unwrap();
    assert_eq!(found, item);
    assert_eq!(found.stats.damage_percent.total(Some("fire")), 12.0);

    let unlinked: Jewel = session
        .find(Filters::new().with("pet_ability_page_url", None::<String>))
        .unwrap();
    assert_eq!(unlinked, jewel);
}

#[test]
fn test_update_wearable_name() {
    let (db, _dir) = create_test_db();
    let mut item = WearableItem {
        page_url: "/wiki/Item:Crown".into(),
        ..Default::default()
    };
    db.transact(|s| s.save(&item)).unwrap();
    db.transact(|s| s.update(&mut item, &Patch::new().set("name", "Crown".to_string())))
        .unwrap();

    let session = db.session().unwrap();
    let found: WearableItem = session
        .find(Filters::new().with("name", "Crown"))
        .unwrap();
    assert_eq!(found.page_url, "/wiki/Item:Crown");
}
