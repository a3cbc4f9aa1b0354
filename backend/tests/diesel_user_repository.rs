//! `DieselUserRepository` against embedded PostgreSQL.
//!
//! Covers unique-column mapping, literal search filters, profile changes and
//! the cascading account delete.

use pagination::PageRequest;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use tsuki::domain::credentials::PasswordHash;
use tsuki::domain::ports::{
    AccountChanges, EdgeRepository, PostRepository, UserPersistenceError, UserRepository,
};
use tsuki::domain::{EdgeKey, Email, Post, PostContent, PostId, UserId};
use tsuki::outbound::persistence::{
    DbPool, DieselEdgeRepository, DieselPostRepository, DieselUserRepository, PoolConfig,
};

mod support;

use support::cluster::shared_cluster_handle;
use support::{
    count_rows, handle_cluster_setup_failure, provision_template_database, stored_account,
};

struct TestContext {
    runtime: Runtime,
    users: DieselUserRepository,
    edges: DieselEdgeRepository,
    posts: DieselPostRepository,
    database_url: String,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn seed(&self, username: &str, email: Option<&str>) -> UserId {
        let account = stored_account(username, email);
        self.runtime
            .block_on(self.users.insert(&account))
            .expect("seed account");
        account.user.id
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster_handle().map_err(|err| err.to_string())?;
    let temp_db = provision_template_database(cluster).map_err(|err| err.to_string())?;
    let database_url = temp_db.url().to_string();

    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        users: DieselUserRepository::new(pool.clone()),
        edges: DieselEdgeRepository::new(pool.clone()),
        posts: DieselPostRepository::new(pool),
        database_url,
        _database: temp_db,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn insert_then_find_by_id_and_username(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: insert_then_find_by_id_and_username skipped");
        return;
    };
    let account = stored_account("ada", Some("ada@example.com"));
    context
        .runtime
        .block_on(context.users.insert(&account))
        .expect("insert");

    let by_id = context
        .runtime
        .block_on(context.users.find_by_id(&account.user.id))
        .expect("find by id")
        .expect("account exists");
    assert_eq!(by_id.username, account.user.username);
    assert_eq!(by_id.email, account.user.email);

    let stored = context
        .runtime
        .block_on(context.users.find_account("ada"))
        .expect("find account")
        .expect("account exists");
    assert_eq!(stored.password_hash, account.password_hash);

    let missing = context
        .runtime
        .block_on(context.users.find_by_username("ADA"))
        .expect("lookup");
    assert!(missing.is_none(), "usernames match case-sensitively");
}

#[rstest]
#[case::username("ada", Some("other@example.com"), "username")]
#[case::email("grace", Some("ada@example.com"), "email")]
fn unique_clashes_name_the_column(
    repo_context: Option<TestContext>,
    #[case] username: &str,
    #[case] email: Option<&str>,
    #[case] field: &str,
) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: unique_clashes_name_the_column skipped");
        return;
    };
    context.seed("ada", Some("ada@example.com"));

    let err = context
        .runtime
        .block_on(context.users.insert(&stored_account(username, email)))
        .expect_err("duplicate");
    assert_eq!(err, UserPersistenceError::duplicate(field));
}

#[rstest]
fn accounts_without_email_do_not_clash(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: accounts_without_email_do_not_clash skipped");
        return;
    };
    context.seed("ada", None);
    context.seed("grace", None);
    assert_eq!(
        count_rows(&context.database_url, "users", "email IS NULL").expect("count"),
        2
    );
}

#[rstest]
fn search_treats_wildcards_literally(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: search_treats_wildcards_literally skipped");
        return;
    };
    for name in ["Ada_L", "adam", "bob"] {
        context.seed(name, None);
    }
    let page = PageRequest::new(Some(10), None);

    let found = context
        .runtime
        .block_on(context.users.search("ADA", &page))
        .expect("search");
    let names: Vec<&str> = found.iter().map(|u| u.username.as_ref()).collect();
    assert_eq!(names, ["Ada_L", "adam"]);

    let literal = context
        .runtime
        .block_on(context.users.search("a_", &page))
        .expect("search");
    let names: Vec<&str> = literal.iter().map(|u| u.username.as_ref()).collect();
    assert_eq!(names, ["Ada_L"]);
}

#[rstest]
fn follow_lists_and_counts(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: follow_lists_and_counts skipped");
        return;
    };
    let ada = context.seed("ada", None);
    let bob = context.seed("bob", None);
    let cy = context.seed("cy", None);
    context.runtime.block_on(async {
        for key in [
            EdgeKey::follow(bob.clone(), &ada),
            EdgeKey::follow(cy.clone(), &ada),
            EdgeKey::follow(ada.clone(), &cy),
        ] {
            context.edges.toggle(&key).await.expect("follow");
        }
    });

    let followers = context
        .runtime
        .block_on(context.users.followers(&ada))
        .expect("followers");
    let names: Vec<&str> = followers.iter().map(|name| name.as_ref()).collect();
    assert_eq!(names, ["bob", "cy"]);
    let counts = context
        .runtime
        .block_on(context.users.follow_counts(&ada))
        .expect("counts");
    assert_eq!((counts.followers, counts.following), (2, 1));
}

#[rstest]
fn update_changes_only_the_given_columns(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: update_changes_only_the_given_columns skipped");
        return;
    };
    let ada = context.seed("ada", Some("ada@example.com"));
    context.seed("grace", Some("grace@example.com"));

    let changes = AccountChanges {
        avatar: Some("https://cdn.example/ada.png".to_owned()),
        password_hash: Some(PasswordHash::from_stored("$argon2id$v=19$rotated")),
        ..AccountChanges::default()
    };
    let updated = context
        .runtime
        .block_on(context.users.update(&ada, &changes))
        .expect("update")
        .expect("account exists");
    assert_eq!(updated.avatar.as_deref(), Some("https://cdn.example/ada.png"));
    assert_eq!(
        updated.email,
        Some(Email::new("ada@example.com").expect("email"))
    );
    let stored = context
        .runtime
        .block_on(context.users.find_account("ada"))
        .expect("find")
        .expect("exists");
    assert_eq!(stored.password_hash.as_str(), "$argon2id$v=19$rotated");

    let clash = AccountChanges {
        email: Some(Email::new("grace@example.com").expect("email")),
        ..AccountChanges::default()
    };
    let err = context
        .runtime
        .block_on(context.users.update(&ada, &clash))
        .expect_err("email taken");
    assert_eq!(err, UserPersistenceError::duplicate("email"));

    let missing = context
        .runtime
        .block_on(context.users.update(&UserId::random(), &changes))
        .expect("update");
    assert!(missing.is_none());
}

#[rstest]
fn delete_cascades_through_edges_and_content(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: delete_cascades_through_edges_and_content skipped");
        return;
    };
    let leaver = context.seed("leaver", None);
    let stayer = context.seed("stayer", None);
    let post = Post {
        id: PostId::random(),
        author: leaver.clone(),
        content: PostContent::new("soon gone").expect("content"),
        image_url: None,
        created_at: chrono::Utc::now(),
    };
    context.runtime.block_on(async {
        context.posts.insert(&post).await.expect("post");
        for key in [
            EdgeKey::follow(stayer.clone(), &leaver),
            EdgeKey::follow(leaver.clone(), &stayer),
            EdgeKey::vote(stayer.clone(), &post.id),
        ] {
            context.edges.toggle(&key).await.expect("edge");
        }
    });

    assert!(
        context
            .runtime
            .block_on(context.users.delete(&leaver))
            .expect("delete")
    );
    assert!(
        !context
            .runtime
            .block_on(context.users.delete(&leaver))
            .expect("repeat delete")
    );
    for table in ["follows", "votes", "posts"] {
        assert_eq!(
            count_rows(&context.database_url, table, "").expect("count"),
            0,
            "{table} rows survive the account"
        );
    }
    assert_eq!(count_rows(&context.database_url, "users", "").expect("count"), 1);
}
