use lisogo::entity::{Entity, EntityRef};
use lisogo_int_test::models::{Note, Post, User};
use lisogo_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_new_entity_is_modified() {
    let note = Note::new("hello", "world");
    assert!(note.is_modified());
    assert!(note.id().is_none());
}

#[test]
fn test_saved_entity_is_clean() {
    run_test(
        || create_test_context(),
        |ctx| {
            let note = EntityRef::new(Note::generate());
            note.save(&ctx.db())?;

            assert!(!note.is_modified());
            assert!(note.id().is_some());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_assigning_same_value_keeps_entity_clean() {
    run_test(
        || create_test_context(),
        |ctx| {
            let note = EntityRef::new(Note::new("hello", "world"));
            note.save(&ctx.db())?;

            note.with_mut(|n: &mut Note| n.set_title("hello"))?;
            assert!(!note.is_modified());

            note.with_mut(|n: &mut Note| n.set_title("bye"))?;
            assert!(note.is_modified());

            // going back to the stored value does not undo the change
            note.with_mut(|n: &mut Note| n.set_title("hello"))?;
            assert!(note.is_modified());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_private_fields_are_not_tracked_or_stored() {
    run_test(
        || create_test_context(),
        |ctx| {
            let note = EntityRef::new(Note::new("hello", "world"));
            note.save(&ctx.db())?;

            note.with_mut(|n: &mut Note| n.set_draft("scratch"))?;
            assert!(!note.is_modified());

            let document = note.read().to_document();
            assert!(!document.contains_key("_draft"));
            assert!(note.with(|n: &Note| n.draft().is_some())?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_loaded_entity_is_clean() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let note = EntityRef::new(Note::new("hello", "world"));
            let id = db.collection("notes")?.insert(&note)?;
            db.clear_cache();

            let loaded = db.collection("notes")?.find_by_id(&id)?.unwrap();
            assert!(!loaded.is_modified());
            assert!(!loaded.ptr_eq(&note));
            assert_eq!(loaded.with(|n: &Note| n.title().to_string())?, "hello");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_changing_a_reference_marks_modified() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let author = EntityRef::new(User::new("martin"));
            let post = EntityRef::new(Post::new("hello", &author));
            post.save(&db)?;
            assert!(!post.is_modified());

            post.with_mut(|p: &mut Post| p.set_author(&author))?;
            assert!(!post.is_modified());

            let other = EntityRef::new(User::new("ada"));
            post.with_mut(|p: &mut Post| p.set_author(&other))?;
            assert!(post.is_modified());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
