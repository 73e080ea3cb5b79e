use lisogo::doc;
use lisogo::entity::EntityRef;
use lisogo::errors::ErrorKind;
use lisogo_int_test::models::{Post, User};
use lisogo_int_test::test_util::{cleanup, create_lazy_test_context, create_test_context, run_test};

#[test]
fn test_reference_is_lazy_until_fetched() {
    run_test(
        || create_lazy_test_context(),
        |ctx| {
            let db = ctx.db();
            assert!(db.lazy_loading_enabled());
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;
            db.clear_cache();

            let loaded = db.collection("posts")?.find_by_id(&post.id().unwrap())?.unwrap();
            assert!(loaded.with(|p: &Post| p.author().is_none())?);

            let lazy = loaded.with(|p: &Post| p.lazy_author().cloned())?.unwrap();
            assert_eq!(lazy.id(), &author.id().unwrap());
            assert_eq!(lazy.type_name(), "User");
            assert_eq!(lazy.collection().name(), "users");

            let fetched = lazy.fetch()?;
            assert_eq!(fetched.with(|u: &User| u.name().to_string())?, "martin");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_fetch_goes_through_identity_cache() {
    run_test(
        || create_lazy_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;

            // only the post leaves the cache
            db.collection("posts")?.cache().clear();
            let loaded = db.collection("posts")?.find_by_id(&post.id().unwrap())?.unwrap();
            let lazy = loaded.with(|p: &Post| p.lazy_author().cloned())?.unwrap();

            assert!(lazy.fetch()?.ptr_eq(&author));
            assert!(lazy.fetch()?.ptr_eq(&lazy.fetch()?));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_lazy_reference_is_written_back_as_id() {
    run_test(
        || create_lazy_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;
            db.clear_cache();

            let loaded = db.collection("posts")?.find_by_id(&post.id().unwrap())?.unwrap();
            loaded.with_mut(|p: &mut Post| p.set_title("changed"))?;
            loaded.save(&db)?;

            db.disable_lazy_loading();
            db.clear_cache();
            let reloaded = db.collection("posts")?.find_by_id(&post.id().unwrap())?.unwrap();
            assert_eq!(reloaded.with(|p: &Post| p.title().to_string())?, "changed");
            let reloaded_author = reloaded.with(|p: &Post| p.author().cloned())?.unwrap();
            assert_eq!(reloaded_author.id(), author.id());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_fetch_of_removed_document_fails() {
    run_test(
        || create_lazy_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;
            db.clear_cache();

            let loaded = db.collection("posts")?.find_by_id(&post.id().unwrap())?.unwrap();
            let lazy = loaded.with(|p: &Post| p.lazy_author().cloned())?.unwrap();

            db.collection("users")?.remove(&doc! { _id: (author.id().unwrap()) })?;
            let err = lazy.fetch().err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_lazy_loading_can_be_toggled() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            assert!(!db.lazy_loading_enabled());
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;
            let id = post.id().unwrap();

            db.enable_lazy_loading();
            db.clear_cache();
            let lazy = db.collection("posts")?.find_by_id(&id)?.unwrap();
            assert!(lazy.with(|p: &Post| p.lazy_author().is_some())?);

            db.disable_lazy_loading();
            db.clear_cache();
            let eager = db.collection("posts")?.find_by_id(&id)?.unwrap();
            assert!(eager.with(|p: &Post| p.author().is_some())?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
