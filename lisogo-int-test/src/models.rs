use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::Name;
use fake::Fake;
use lisogo::collection::Collection;
use lisogo::common::Value;
use lisogo::database::Database;
use lisogo::entity::{Entity, EntityRef, EntityState, LazyReference, TypeRegistry};
use lisogo::errors::OdmResult;

pub const MODEL_NAMESPACE: &str = "blog.model";

/// Registers every model of this crate.
pub fn model_registry() -> TypeRegistry {
    let registry = TypeRegistry::new(MODEL_NAMESPACE);
    registry
        .register::<Note>()
        .register::<Tag>()
        .register::<User>()
        .register::<Post>()
        .register::<Comment>();
    registry
}

macro_rules! entity_impl {
    ($type:ty, $tag:literal, None) => {
        impl Entity for $type {
            fn type_name(&self) -> &str {
                $tag
            }

            fn state(&self) -> &EntityState {
                &self.state
            }

            fn state_mut(&mut self) -> &mut EntityState {
                &mut self.state
            }

            fn collection(&self, _db: &Database) -> OdmResult<Option<Collection>> {
                Ok(None)
            }
        }
    };
    ($type:ty, $tag:literal, $collection:literal) => {
        impl Entity for $type {
            fn type_name(&self) -> &str {
                $tag
            }

            fn state(&self) -> &EntityState {
                &self.state
            }

            fn state_mut(&mut self) -> &mut EntityState {
                &mut self.state
            }

            fn collection(&self, db: &Database) -> OdmResult<Option<Collection>> {
                Ok(Some(db.collection($collection)?))
            }
        }
    };
}

#[derive(Default)]
pub struct Note {
    state: EntityState,
}

impl Note {
    pub fn new(title: &str, body: &str) -> Self {
        let mut note = Note::default();
        note.state.set("title", title);
        note.state.set("body", body);
        note
    }

    pub fn generate() -> Self {
        Note::new(&Sentence(2..5).fake::<String>(), &Paragraph(1..3).fake::<String>())
    }

    pub fn title(&self) -> &str {
        self.state.get_str("title").unwrap_or_default()
    }

    pub fn set_title(&mut self, title: &str) {
        self.state.set("title", title);
    }

    pub fn body(&self) -> &str {
        self.state.get_str("body").unwrap_or_default()
    }

    pub fn set_body(&mut self, body: &str) {
        self.state.set("body", body);
    }

    /// Scratch data that never reaches the store.
    pub fn set_draft(&mut self, draft: &str) {
        self.state.set("_draft", draft);
    }

    pub fn draft(&self) -> Option<&str> {
        self.state.get_str("_draft")
    }
}

entity_impl!(Note, "Note", "notes");

/// Only ever embedded in another entity.
#[derive(Default)]
pub struct Tag {
    state: EntityState,
}

impl Tag {
    pub fn new(label: &str) -> Self {
        let mut tag = Tag::default();
        tag.state.set("label", label);
        tag
    }

    pub fn generate() -> Self {
        Tag::new(&Word().fake::<String>())
    }

    pub fn label(&self) -> &str {
        self.state.get_str("label").unwrap_or_default()
    }
}

entity_impl!(Tag, "Tag", None);

#[derive(Default)]
pub struct User {
    state: EntityState,
}

impl User {
    pub fn new(name: &str) -> Self {
        let mut user = User::default();
        user.state.set("name", name);
        user
    }

    pub fn generate() -> Self {
        User::new(&Name().fake::<String>())
    }

    pub fn name(&self) -> &str {
        self.state.get_str("name").unwrap_or_default()
    }

    pub fn set_name(&mut self, name: &str) {
        self.state.set("name", name);
    }

    pub fn friend(&self) -> Option<EntityRef> {
        self.state.get_entity("friend").cloned()
    }

    pub fn set_friend(&mut self, friend: &EntityRef) {
        self.state.set("friend", friend);
    }
}

entity_impl!(User, "User", "users");

/// A post references its author and embeds its tags.
#[derive(Default)]
pub struct Post {
    state: EntityState,
}

impl Post {
    pub fn new(title: &str, author: &EntityRef) -> Self {
        let mut post = Post::default();
        post.state.set("title", title);
        post.state.set("author", author);
        post
    }

    pub fn with_tags(mut self, tags: Vec<EntityRef>) -> Self {
        self.state.set("tags", tags);
        self
    }

    pub fn title(&self) -> &str {
        self.state.get_str("title").unwrap_or_default()
    }

    pub fn set_title(&mut self, title: &str) {
        self.state.set("title", title);
    }

    /// The author once it has been loaded.
    pub fn author(&self) -> Option<&EntityRef> {
        self.state.get_entity("author")
    }

    /// The author as read while lazy loading was on.
    pub fn lazy_author(&self) -> Option<&LazyReference> {
        self.state.get_lazy("author")
    }

    pub fn author_value(&self) -> Option<&Value> {
        self.state.get("author")
    }

    pub fn set_author(&mut self, author: &EntityRef) {
        self.state.set("author", author);
    }

    pub fn tags(&self) -> Vec<EntityRef> {
        match self.state.get("tags").and_then(Value::as_array) {
            Some(values) => values.iter().filter_map(Value::as_entity).cloned().collect(),
            None => Vec::new(),
        }
    }
}

entity_impl!(Post, "Post", "posts");

/// A comment references the post it belongs to and its author.
#[derive(Default)]
pub struct Comment {
    state: EntityState,
}

impl Comment {
    pub fn new(text: &str, post: &EntityRef, author: &EntityRef) -> Self {
        let mut comment = Comment::default();
        comment.state.set("text", text);
        comment.state.set("post", post);
        comment.state.set("author", author);
        comment
    }

    pub fn text(&self) -> &str {
        self.state.get_str("text").unwrap_or_default()
    }

    pub fn post(&self) -> Option<&EntityRef> {
        self.state.get_entity("post")
    }

    pub fn author(&self) -> Option<&EntityRef> {
        self.state.get_entity("author")
    }
}

entity_impl!(Comment, "Comment", "comments");
