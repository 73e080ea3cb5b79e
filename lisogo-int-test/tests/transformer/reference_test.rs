use lisogo::common::Value;
use lisogo::doc;
use lisogo::entity::{EntityRef, TypeRegistry};
use lisogo::errors::ErrorKind;
use lisogo_int_test::models::{Comment, Post, User, MODEL_NAMESPACE};
use lisogo_int_test::test_util::{cleanup, create_test_context, open_sibling, run_test};

#[test]
fn test_saving_post_saves_author_first() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;

            let author_id = author.id().unwrap();
            assert!(!author.is_modified());
            assert_eq!(db.collection("users")?.count(&doc! {})?, 1);

            let posts = db.collection("posts")?;
            let stored = db.store().find_one(posts.namespace(), &doc! { _id: (post.id().unwrap()) })?.unwrap();
            assert_eq!(stored.get("author"), Some(&Value::Id(author_id.clone())));

            let mapping = stored.types_mapping().unwrap();
            assert_eq!(mapping.get(&author_id.mapping_key()), Some(&Value::from("User")));
            assert_eq!(stored.type_name(), Some("Post"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_saved_author_is_updated_through_post() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            author.save(&db)?;
            let id = author.id().unwrap();

            let post = EntityRef::new(Post::new("hello", &author));
            author.with_mut(|u: &mut User| u.set_name("martin f."))?;
            post.save(&db)?;

            assert_eq!(author.id(), Some(id.clone()));
            assert!(!author.is_modified());

            let copy = EntityRef::new(User::default());
            copy.retrieve(&id, &db)?;
            assert_eq!(copy.with(|u: &User| u.name().to_string())?, "martin f.");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_author_is_loaded_eagerly() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;
            db.clear_cache();

            let loaded = db.collection("posts")?.find_by_id(&post.id().unwrap())?.unwrap();
            let loaded_author = loaded.with(|p: &Post| p.author().cloned())?.unwrap();
            assert!(loaded_author.is::<User>());
            assert_eq!(loaded_author.id(), author.id());
            assert_eq!(loaded_author.with(|u: &User| u.name().to_string())?, "martin");
            assert!(!loaded_author.is_modified());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_comment_saves_whole_graph() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            let comment = EntityRef::new(Comment::new("nice", &post, &author));
            comment.save(&db)?;

            assert!(author.id().is_some());
            assert!(post.id().is_some());
            assert!(comment.id().is_some());
            assert_eq!(db.collection("users")?.count(&doc! {})?, 1);
            assert_eq!(db.collection("posts")?.count(&doc! {})?, 1);

            db.clear_cache();
            let loaded = db.collection("comments")?.find_by_id(&comment.id().unwrap())?.unwrap();
            let loaded_post = loaded.with(|c: &Comment| c.post().cloned())?.unwrap();
            assert_eq!(loaded_post.id(), post.id());
            assert_eq!(loaded_post.with(|p: &Post| p.title().to_string())?, "hello");

            // the post's own author reference is resolved too
            let nested_author = loaded_post.with(|p: &Post| p.author().cloned())?.unwrap();
            assert_eq!(nested_author.with(|u: &User| u.name().to_string())?, "martin");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_dangling_reference_fails_eager_load() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;

            db.collection("users")?.remove(&doc! { _id: (author.id().unwrap()) })?;
            db.clear_cache();

            let err = db.collection("posts")?.find_by_id(&post.id().unwrap()).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unregistered_reference_type_stays_raw() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;

            let registry = TypeRegistry::new(MODEL_NAMESPACE);
            registry.register::<Post>();
            let sibling = open_sibling(&ctx, registry)?;

            let loaded = sibling.collection("posts")?.find_by_id(&post.id().unwrap())?.unwrap();
            let value = loaded.with(|p: &Post| p.author_value().cloned())?;
            assert_eq!(value, Some(Value::Id(author.id().unwrap())));
            sibling.close()?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_outgoing_without_collection_keeps_ids() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            let posts = db.collection("posts")?;
            let document = posts.serialize(&post)?;

            let restored = db.transformer().transform_outgoing(document, None)?;
            assert_eq!(restored.get("author"), Some(&Value::Id(author.id().unwrap())));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_reference_cycle_round_trip() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let alice = EntityRef::new(User::new("alice"));
            let bob = EntityRef::new(User::new("bob"));
            alice.with_mut(|u: &mut User| u.set_friend(&bob))?;
            bob.with_mut(|u: &mut User| u.set_friend(&alice))?;

            alice.save(&db)?;
            let alice_id = alice.id().unwrap();
            assert!(bob.id().is_some());
            assert!(!bob.is_modified());

            let users = db.collection("users")?;
            assert_eq!(users.count(&doc! {})?, 2);

            db.clear_cache();
            let loaded = users.find_by_id(&alice_id)?.unwrap();
            assert!(!loaded.ptr_eq(&alice));
            let friend = loaded.with(|u: &User| u.friend())?.unwrap();
            assert_eq!(friend.with(|u: &User| u.name().to_string())?, "bob");
            let back = friend.with(|u: &User| u.friend())?.unwrap();
            assert!(back.ptr_eq(&loaded));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
