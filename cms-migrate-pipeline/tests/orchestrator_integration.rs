//! Integration tests for the migration orchestrator.
//!
//! These tests run the real Orchestrator against the in-memory legacy source
//! and target store.

use std::path::Path;
use std::sync::Arc;

use cms_migrate_pipeline::{MediaConfig, NamedSize, Orchestrator, Phase, PipelineConfig, Sanitizer};
use cms_migrate_repository::mock::LegacySnapshot;
use cms_migrate_repository::{MockLegacySource, MockTargetStore};
use cms_migrate_shared::types::{
    CommentStatus, ContentFamily, ContentRef, LegacyComment, LegacyMeta, LegacyOption, LegacyPost,
    LegacyTerm, LegacyTermRelationship, LegacyTermTaxonomy, LegacyUser, MetaEntry, UserRole,
};
use image::{ImageBuffer, Rgb};

fn post(id: u64, post_type: &str, slug: &str, title: &str) -> LegacyPost {
    LegacyPost {
        id,
        author_id: 1,
        post_type: post_type.to_string(),
        status: "publish".to_string(),
        title: title.to_string(),
        slug: slug.to_string(),
        created_at: Some("2021-05-01 10:00:00".to_string()),
        modified_at: Some("0000-00-00 00:00:00".to_string()),
        ..Default::default()
    }
}

fn meta(meta_id: u64, owner_id: u64, key: &str, value: &str) -> LegacyMeta {
    LegacyMeta {
        meta_id,
        owner_id,
        key: key.to_string(),
        value: Some(value.to_string()),
    }
}

fn term(id: u64, slug: &str) -> LegacyTerm {
    LegacyTerm {
        id,
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        group: 0,
    }
}

fn taxonomy(id: u64, term_id: u64, kind: &str, parent_id: u64) -> LegacyTermTaxonomy {
    LegacyTermTaxonomy {
        id,
        term_id,
        taxonomy: kind.to_string(),
        parent_id,
        ..Default::default()
    }
}

fn relationship(object_id: u64, term_taxonomy_id: u64) -> LegacyTermRelationship {
    LegacyTermRelationship {
        object_id,
        term_taxonomy_id,
        term_order: 0,
    }
}

/// A small site: two users, a page, an article, a three-level category tree
/// listed child first, comments, one menu and a few options.
fn site() -> LegacySnapshot {
    let mut about = post(42, "page", "", "About");
    about.content = "[fusion_builder_container][fusion_text]About us[/fusion_text][/fusion_builder_container]".into();
    let mut hello = post(43, "post", "hello", "Hello");
    hello.content = "Intro\n\n\n\n[gallery ids=\"1,2\"]Body".into();
    let draft = LegacyPost {
        status: "auto-draft".into(),
        ..post(44, "post", "draft", "Draft")
    };

    LegacySnapshot {
        users: vec![
            LegacyUser {
                id: 1,
                login: "admin".into(),
                email: "admin@example.com".into(),
                display_name: "Admin".into(),
                ..Default::default()
            },
            LegacyUser {
                id: 2,
                login: "writer".into(),
                ..Default::default()
            },
        ],
        posts: vec![about, hello, draft, post(50, "nav_menu_item", "", "")],
        post_meta: vec![
            meta(1, 42, "_thumbnail_id", "999"),
            meta(2, 43, "subtitle", "a:1:{s:4:\"text\";s:2:\"hi\";}"),
            meta(3, 50, "_menu_item_type", "post_type"),
            meta(4, 50, "_menu_item_object", "page"),
            meta(5, 50, "_menu_item_object_id", "42"),
        ],
        terms: vec![term(1, "c"), term(2, "b"), term(3, "a"), term(10, "main")],
        term_taxonomies: vec![
            taxonomy(1, 1, "category", 2),
            taxonomy(2, 2, "category", 3),
            taxonomy(3, 3, "category", 0),
            taxonomy(10, 10, "nav_menu", 0),
        ],
        term_relationships: vec![
            relationship(42, 1),
            relationship(43, 1),
            relationship(43, 3),
            relationship(9999, 1),
            relationship(50, 10),
        ],
        comments: vec![
            LegacyComment {
                id: 1,
                post_id: 43,
                author_name: " Reader ".into(),
                content: "Nice".into(),
                approved: "1".into(),
                ..Default::default()
            },
            LegacyComment {
                id: 2,
                post_id: 43,
                content: "Thanks".into(),
                approved: "0".into(),
                parent_id: 1,
                user_id: 1,
                ..Default::default()
            },
            LegacyComment {
                id: 3,
                post_id: 9999,
                content: "Orphan".into(),
                approved: "1".into(),
                ..Default::default()
            },
        ],
        options: vec![
            LegacyOption {
                id: 1,
                name: "blogname".into(),
                value: "My Site".into(),
                autoload: "yes".into(),
            },
            LegacyOption {
                id: 2,
                name: "_transient_feed".into(),
                value: "x".into(),
                autoload: "no".into(),
            },
        ],
        ..Default::default()
    }
}

fn config_without_media() -> PipelineConfig {
    PipelineConfig {
        media: MediaConfig {
            root: "/nonexistent/uploads".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn orchestrator(snapshot: LegacySnapshot, target: &Arc<MockTargetStore>, config: PipelineConfig) -> Orchestrator {
    Orchestrator::new(Arc::new(MockLegacySource::new(snapshot)), target.clone(), config).unwrap()
}

fn meta_value<'a>(entries: &'a [MetaEntry], key: &str) -> Option<&'a MetaEntry> {
    entries.iter().find(|entry| entry.key == key)
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 90]));
    img.save(path).unwrap();
}

#[tokio::test]
async fn test_full_run_migrates_every_family() {
    let target = Arc::new(MockTargetStore::new());
    let report = orchestrator(site(), &target, config_without_media()).run().await.unwrap();

    let phases: Vec<Phase> = report.phases.iter().map(|summary| summary.phase).collect();
    assert_eq!(
        phases,
        vec![
            Phase::Users,
            Phase::Taxonomy,
            Phase::Content,
            Phase::Media,
            Phase::Comments,
            Phase::TermRelationships,
            Phase::Menus,
            Phase::Settings,
        ]
    );
    assert_eq!(report.failed(), 0);

    let users = target.users();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].1.role, UserRole::Superadmin);
    assert_eq!(users[1].1.email, "user-2@example.local");
    assert_eq!(users[1].1.display_name, "writer");
    assert_eq!(users[1].1.role, UserRole::Author);

    let settings = target.settings();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].key, "blogname");
}

#[tokio::test]
async fn test_blank_slug_gets_fallback_and_content_is_sanitized() {
    let target = Arc::new(MockTargetStore::new());
    let report = orchestrator(site(), &target, config_without_media()).run().await.unwrap();

    let pages = target.content(ContentFamily::Page);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].1.record.slug, "post-42");
    assert_eq!(pages[0].1.record.translation.content, "About us");
    assert_eq!(pages[0].1.record.translation.language, "de");

    let articles = target.content(ContentFamily::Article);
    assert_eq!(articles.len(), 1, "auto-draft must be skipped");
    let hello = &articles[0].1.record;
    assert_eq!(hello.slug, "hello");
    assert_eq!(hello.translation.content, "Intro\n\nBody");
    assert_eq!(hello.author_id, Some(target.users()[0].0));

    let subtitle = target.content_meta(ContentRef::new(ContentFamily::Article, articles[0].0));
    assert_eq!(
        meta_value(&subtitle, "subtitle").map(|entry| entry.value.clone()),
        Some(serde_json::json!({ "text": "hi" }))
    );

    let content = report
        .phases
        .iter()
        .find(|summary| summary.phase == Phase::Content)
        .unwrap();
    assert_eq!((content.created, content.skipped), (2, 1));
}

#[tokio::test]
async fn test_sanitized_content_is_stable_under_resanitizing() {
    let target = Arc::new(MockTargetStore::new());
    orchestrator(site(), &target, config_without_media()).run().await.unwrap();

    let sanitizer = Sanitizer::default();
    for family in [ContentFamily::Page, ContentFamily::Article] {
        for (_, row) in target.content(family) {
            let content = &row.record.translation.content;
            assert_eq!(&sanitizer.sanitize(content), content);
        }
    }
}

#[tokio::test]
async fn test_taxonomy_parents_link_regardless_of_order() {
    let target = Arc::new(MockTargetStore::new());
    orchestrator(site(), &target, config_without_media()).run().await.unwrap();

    let terms = target.terms();
    let term_id = |slug: &str| terms.iter().find(|(_, t)| t.slug == slug).map(|(id, _)| *id).unwrap();
    let taxonomies = target.term_taxonomies();
    let taxonomy_of = |slug: &str| {
        let term = term_id(slug);
        taxonomies
            .iter()
            .find(|(_, t)| t.record.term_id == term)
            .map(|(id, t)| (*id, t.parent_id))
            .unwrap()
    };

    let (a, a_parent) = taxonomy_of("a");
    let (b, b_parent) = taxonomy_of("b");
    let (_, c_parent) = taxonomy_of("c");
    assert_eq!(a_parent, None);
    assert_eq!(b_parent, Some(a));
    assert_eq!(c_parent, Some(b));
}

#[tokio::test]
async fn test_relationships_reference_exactly_one_family() {
    let target = Arc::new(MockTargetStore::new());
    let report = orchestrator(site(), &target, config_without_media()).run().await.unwrap();

    let page_id = target.content(ContentFamily::Page)[0].0;
    let article_id = target.content(ContentFamily::Article)[0].0;
    let relationships = target.term_relationships();
    assert_eq!(relationships.len(), 3);

    let contents: Vec<ContentRef> = relationships.iter().map(|r| r.content).collect();
    assert!(contents.contains(&ContentRef::new(ContentFamily::Page, page_id)));
    assert_eq!(
        contents
            .iter()
            .filter(|content| **content == ContentRef::new(ContentFamily::Article, article_id))
            .count(),
        2
    );

    let summary = report
        .phases
        .iter()
        .find(|summary| summary.phase == Phase::TermRelationships)
        .unwrap();
    assert_eq!(summary.created, 3);
    assert_eq!(summary.skipped, 2, "unknown object and menu item are dropped");
}

#[tokio::test]
async fn test_comments_keep_orphans_and_link_replies() {
    let target = Arc::new(MockTargetStore::new());
    orchestrator(site(), &target, config_without_media()).run().await.unwrap();

    let article_id = target.content(ContentFamily::Article)[0].0;
    let comments = target.comments();
    assert_eq!(comments.len(), 3);

    let (first_id, first) = &comments[0];
    assert_eq!(first.record.content, Some(ContentRef::new(ContentFamily::Article, article_id)));
    assert_eq!(first.record.author_name, "Reader");
    assert_eq!(first.record.status, CommentStatus::Approved);

    let reply = &comments[1].1;
    assert_eq!(reply.parent_id, Some(*first_id));
    assert_eq!(reply.record.status, CommentStatus::Pending);
    assert_eq!(reply.record.user_id, Some(target.users()[0].0));

    let orphan = &comments[2].1;
    assert_eq!(orphan.record.content, None);
}

#[tokio::test]
async fn test_menu_item_points_at_migrated_page() {
    let target = Arc::new(MockTargetStore::new());
    orchestrator(site(), &target, config_without_media()).run().await.unwrap();

    let menus = target.menus();
    assert_eq!(menus.len(), 1);
    assert_eq!(menus[0].1.location, "main");

    let items = target.menu_items();
    assert_eq!(items.len(), 1);
    let item = &items[0].1.record;
    assert_eq!(item.menu_id, menus[0].0);
    assert_eq!(item.title, "About");
    assert_eq!(item.route.as_deref(), Some("/post-42"));
    assert_eq!(item.target, "_self");
    assert_eq!(item.page_id, Some(target.content(ContentFamily::Page)[0].0));
    assert_eq!(item.article_id, None);
}

#[tokio::test]
async fn test_missing_featured_image_keeps_null_media() {
    let target = Arc::new(MockTargetStore::new());
    orchestrator(site(), &target, config_without_media()).run().await.unwrap();

    let page_id = target.content(ContentFamily::Page)[0].0;
    let entries = target.content_meta(ContentRef::new(ContentFamily::Page, page_id));
    let featured = meta_value(&entries, "featured_image").unwrap();
    assert_eq!(featured.media_id, None);
    assert_eq!(featured.value["wp_attachment_id"], 999);
}

#[tokio::test]
async fn test_media_group_becomes_one_media_with_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let month = dir.path().join("2021/05");
    write_jpeg(&month.join("photo.jpg"), 64, 48);
    write_jpeg(&month.join("photo-medium.jpg"), 32, 24);

    let mut snapshot = site();
    snapshot.posts.push(LegacyPost {
        mime_type: "image/jpeg".into(),
        ..post(7, "attachment", "photo", "Photo")
    });
    snapshot.post_meta.push(meta(20, 7, "_wp_attached_file", "2021/05/photo.jpg"));
    snapshot.post_meta.push(meta(21, 7, "_wp_attachment_image_alt", "A photo"));
    snapshot.post_meta.push(meta(22, 43, "_thumbnail_id", "7"));

    let config = PipelineConfig {
        media: MediaConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };
    let target = Arc::new(MockTargetStore::new());
    orchestrator(snapshot, &target, config).run().await.unwrap();

    let media = target.media();
    assert_eq!(media.len(), 1);
    let (media_id, record) = &media[0];
    assert_eq!(record.path, "/uploads/2021/05/photo.jpg");
    assert_eq!(record.mime_type, "image/jpeg");
    assert_eq!((record.width, record.height), (Some(64), Some(48)));
    assert_eq!(record.wp_attachment_id, Some(7));
    assert_eq!(record.alt.as_deref(), Some("A photo"));

    let sizes = target.media_sizes();
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0].media_id, *media_id);
    assert_eq!(sizes[0].name, "medium");
    assert_eq!(sizes[0].path, "/uploads/2021/05/photo-medium.jpg");

    let article_id = target.content(ContentFamily::Article)[0].0;
    let entries = target.content_meta(ContentRef::new(ContentFamily::Article, article_id));
    assert_eq!(meta_value(&entries, "featured_image").unwrap().media_id, Some(*media_id));
}

#[tokio::test]
async fn test_rerun_produces_identical_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_jpeg(&dir.path().join("2022/01/logo.jpg"), 16, 16);
    let config = PipelineConfig {
        media: MediaConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };

    let target = Arc::new(MockTargetStore::new());
    let orchestrator = orchestrator(site(), &target, config);
    let first = orchestrator.run().await.unwrap();
    let second = orchestrator.run().await.unwrap();

    assert!(first.table_counts.iter().any(|count| count.rows > 0));
    assert_eq!(first.table_counts, second.table_counts);
    assert_eq!(first.phases, second.phases);
}

#[tokio::test]
async fn test_fallback_slug_never_takes_an_existing_slug() {
    let mut snapshot = site();
    snapshot.posts.push(post(7, "page", "post-42", "Real"));
    snapshot.term_relationships.push(relationship(7, 3));

    let target = Arc::new(MockTargetStore::new());
    orchestrator(snapshot, &target, config_without_media()).run().await.unwrap();

    let pages = target.content(ContentFamily::Page);
    assert_eq!(pages.len(), 2);
    let page = |title: &str| pages.iter().find(|(_, p)| p.record.translation.title == title).unwrap();
    let (real_id, real) = page("Real");
    let (blank_id, blank) = page("About");
    assert_eq!(real.record.slug, "post-42");
    assert_eq!(blank.record.slug, "post-42-2");

    let relationships = target.term_relationships();
    assert!(relationships.iter().any(|r| r.content == ContentRef::new(ContentFamily::Page, *real_id)));
    assert!(relationships.iter().any(|r| r.content == ContentRef::new(ContentFamily::Page, *blank_id)));

    let items = target.menu_items();
    assert_eq!(items[0].1.record.route.as_deref(), Some("/post-42-2"));
    assert_eq!(items[0].1.record.page_id, Some(*blank_id));
}

#[tokio::test]
async fn test_invalid_timestamps_are_replaced() {
    let mut snapshot = site();
    snapshot.posts[1].created_at = Some("1960-01-01 00:00:00".into());

    let target = Arc::new(MockTargetStore::new());
    orchestrator(snapshot, &target, config_without_media()).run().await.unwrap();

    let epoch = chrono::DateTime::from_timestamp(0, 0).unwrap();
    let page = &target.content(ContentFamily::Page)[0].1.record;
    assert_eq!(page.created_at.to_rfc3339(), "2021-05-01T10:00:00+00:00");
    assert!(page.updated_at > epoch, "zero date must not survive");

    let article = &target.content(ContentFamily::Article)[0].1.record;
    assert!(article.created_at > epoch, "pre-epoch date must not survive");
    for (_, comment) in target.comments() {
        assert!(comment.record.created_at >= epoch);
    }
}

#[tokio::test]
async fn test_taxonomy_cycle_leaves_one_root() {
    let mut snapshot = site();
    snapshot.terms.extend([term(20, "x"), term(21, "y")]);
    snapshot
        .term_taxonomies
        .extend([taxonomy(20, 20, "category", 21), taxonomy(21, 21, "category", 20)]);

    let target = Arc::new(MockTargetStore::new());
    let report = orchestrator(snapshot, &target, config_without_media()).run().await.unwrap();
    assert_eq!(report.failed(), 0);

    let terms = target.terms();
    let term_id = |slug: &str| terms.iter().find(|(_, t)| t.slug == slug).map(|(id, _)| *id).unwrap();
    let taxonomies = target.term_taxonomies();
    let taxonomy_of = |slug: &str| {
        let term = term_id(slug);
        taxonomies
            .iter()
            .find(|(_, t)| t.record.term_id == term)
            .map(|(id, t)| (*id, t.parent_id))
            .unwrap()
    };

    let (_, x_parent) = taxonomy_of("x");
    let (y, y_parent) = taxonomy_of("y");
    assert_eq!(x_parent, Some(y));
    assert_eq!(y_parent, None, "second link of the cycle is refused");
}

/// A menu with a custom link, a page link with a taxonomy child, and two
/// items that name each other as parent.
fn menu_site() -> LegacySnapshot {
    fn item(id: u64, title: &str) -> LegacyPost {
        post(id, "nav_menu_item", "", title)
    }
    fn item_meta(first_meta_id: u64, owner: u64, entries: &[(&str, &str)]) -> Vec<LegacyMeta> {
        entries
            .iter()
            .enumerate()
            .map(|(i, (key, value))| meta(first_meta_id + i as u64, owner, key, value))
            .collect()
    }

    let mut post_meta = Vec::new();
    post_meta.extend(item_meta(100, 70, &[
        ("_menu_item_type", "custom"),
        ("_menu_item_url", "https://example.com"),
        ("_menu_item_target", "_blank"),
        ("_menu_item_menu_order", "1"),
    ]));
    post_meta.extend(item_meta(110, 71, &[
        ("_menu_item_type", "post_type"),
        ("_menu_item_object", "page"),
        ("_menu_item_object_id", "60"),
        ("_menu_item_menu_order", "2"),
    ]));
    post_meta.extend(item_meta(120, 72, &[
        ("_menu_item_type", "taxonomy"),
        ("_menu_item_object", "category"),
        ("_menu_item_object_id", "5"),
        ("_menu_item_menu_item_parent", "71"),
        ("_menu_item_menu_order", "3"),
    ]));
    post_meta.extend(item_meta(130, 73, &[
        ("_menu_item_type", "custom"),
        ("_menu_item_url", "/a"),
        ("_menu_item_menu_item_parent", "74"),
        ("_menu_item_menu_order", "4"),
    ]));
    post_meta.extend(item_meta(140, 74, &[
        ("_menu_item_type", "custom"),
        ("_menu_item_url", "/b"),
        ("_menu_item_menu_item_parent", "73"),
        ("_menu_item_menu_order", "5"),
    ]));

    LegacySnapshot {
        posts: vec![
            post(60, "page", "services", "Services"),
            item(70, "External"),
            item(71, ""),
            item(72, ""),
            item(73, "Loop A"),
            item(74, "Loop B"),
        ],
        post_meta,
        terms: vec![term(5, "news"), term(10, "main")],
        term_taxonomies: vec![taxonomy(5, 5, "category", 0), taxonomy(10, 10, "nav_menu", 0)],
        term_relationships: (70..=74).map(|id| relationship(id, 10)).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_menu_routes_and_parents() {
    let target = Arc::new(MockTargetStore::new());
    let report = orchestrator(menu_site(), &target, config_without_media()).run().await.unwrap();
    assert_eq!(report.failed(), 0);

    let items = target.menu_items();
    assert_eq!(items.len(), 5);
    let item = |title: &str| items.iter().find(|(_, i)| i.record.title == title).unwrap();

    let (_, external) = item("External");
    assert_eq!(external.record.url.as_deref(), Some("https://example.com"));
    assert_eq!(external.record.route, None);
    assert_eq!(external.record.target, "_blank");
    assert_eq!(external.parent_id, None);

    let (services_id, services) = item("Services");
    assert_eq!(services.record.route.as_deref(), Some("/services"));
    assert_eq!(services.record.page_id, Some(target.content(ContentFamily::Page)[0].0));

    let (_, news) = item("NEWS");
    assert_eq!(news.record.route.as_deref(), Some("/category/news"));
    assert_eq!(news.parent_id, Some(*services_id));

    let (_, loop_a) = item("Loop A");
    let (loop_b_id, loop_b) = item("Loop B");
    assert_eq!(loop_a.parent_id, Some(*loop_b_id));
    assert_eq!(loop_b.parent_id, None, "second link of the cycle is refused");

    let orders: Vec<i32> = items.iter().map(|(_, i)| i.record.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_media_conversion_generates_sizes_and_removes_sources() {
    let dir = tempfile::tempdir().unwrap();
    let month = dir.path().join("2021/05");
    write_jpeg(&month.join("photo.jpg"), 64, 48);
    write_jpeg(&month.join("photo-medium.jpg"), 24, 18);

    let mut snapshot = site();
    snapshot.posts.push(LegacyPost {
        mime_type: "image/jpeg".into(),
        ..post(7, "attachment", "photo", "Photo")
    });
    snapshot.post_meta.push(meta(20, 7, "_wp_attached_file", "2021/05/photo.jpg"));

    let config = PipelineConfig {
        media: MediaConfig {
            root: dir.path().to_path_buf(),
            max_width: 32,
            max_height: 32,
            named_sizes: vec![
                NamedSize::new("thumbnail", 8, 8),
                NamedSize::new("medium", 24, 24),
                NamedSize::new("large", 40, 40),
            ],
            generate_variants: true,
            convert_originals: true,
            remove_superseded: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let target = Arc::new(MockTargetStore::new());
    let report = orchestrator(snapshot, &target, config).run().await.unwrap();
    assert_eq!(report.failed(), 0);

    let media = target.media();
    assert_eq!(media.len(), 1);
    let (media_id, record) = &media[0];
    assert_eq!(record.path, "/uploads/2021/05/photo.webp");
    assert_eq!(record.mime_type, "image/webp");
    assert_eq!((record.width, record.height), (Some(32), Some(24)));
    assert_eq!(record.wp_attachment_id, Some(7));

    let mut sizes: Vec<(String, String, Option<i32>)> = target
        .media_sizes()
        .into_iter()
        .inspect(|size| assert_eq!(size.media_id, *media_id))
        .map(|size| (size.name, size.path, size.width))
        .collect();
    sizes.sort();
    assert_eq!(
        sizes,
        vec![
            ("large".to_string(), "/uploads/2021/05/photo-large.webp".to_string(), Some(40)),
            ("medium".to_string(), "/uploads/2021/05/photo-medium.jpg".to_string(), Some(24)),
            ("thumbnail".to_string(), "/uploads/2021/05/photo-thumbnail.webp".to_string(), Some(8)),
        ]
    );

    assert_eq!(image::image_dimensions(month.join("photo.webp")).unwrap(), (32, 24));
    assert_eq!(image::image_dimensions(month.join("photo-thumbnail.webp")).unwrap(), (8, 8));
    assert_eq!(image::image_dimensions(month.join("photo-large.webp")).unwrap(), (40, 40));
    assert!(!month.join("photo.jpg").exists(), "superseded original is removed");
    assert!(month.join("photo-medium.jpg").exists(), "variant without a converted copy is kept");
}
