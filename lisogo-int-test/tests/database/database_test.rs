use lisogo::doc;
use lisogo::entity::EntityRef;
use lisogo::errors::ErrorKind;
use lisogo_int_test::models::{Note, Post, User};
use lisogo_int_test::test_util::{cleanup, create_test_context, insert_test_notes, run_test};

#[test]
fn test_collection_names() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            assert!(db.collection_names()?.is_empty());

            let author = EntityRef::new(User::generate());
            EntityRef::new(Post::new("hello", &author)).save(&db)?;
            insert_test_notes(&db, 1)?;

            assert_eq!(db.collection_names()?, vec!["notes", "posts", "users"]);
            assert!(db.has_collection("posts")?);
            assert!(!db.has_collection("comments")?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_collection_namespace() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            assert_eq!(notes.name(), "notes");
            assert_eq!(notes.namespace(), format!("{}.notes", ctx.name()));
            assert!(notes.database().ptr_eq(&ctx.db()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_invalid_collection_names() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            for name in ["", "a$b", "system.users", "a\0b"] {
                let err = db.collection(name).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::InvalidCollectionName);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_closed_database_rejects_operations() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let notes = db.collection("notes")?;
            let note = EntityRef::new(Note::generate());
            notes.insert(&note)?;

            db.close()?;
            assert!(db.is_closed());
            // closing twice is fine
            db.close()?;

            assert_eq!(db.collection("notes").err().unwrap().kind(), &ErrorKind::StoreClosed);
            assert_eq!(notes.count(&doc! {}).err().unwrap().kind(), &ErrorKind::StoreClosed);
            assert_eq!(notes.find(&doc! {}).err().unwrap().kind(), &ErrorKind::StoreClosed);
            assert_eq!(
                EntityRef::new(Note::generate()).save(&db).err().unwrap().kind(),
                &ErrorKind::StoreClosed
            );
            assert!(db.store().is_closed());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_close_tears_down_caches() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            insert_test_notes(&db, 2)?;
            assert!(!db.cache_registry().is_empty());

            db.close()?;
            assert!(db.cache_registry().is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
