/// Document collections
pub const USERS_COLLECTION: &str = "users";
pub const CHATS_COLLECTION: &str = "chats";

/// Local storage key holding the JSON unread map
pub const NEW_MESSAGES_KEY: &str = "newMessages";

/// Chat list previews are cut after this many characters
pub const PREVIEW_MAX_CHARS: usize = 25;

/// Preview text for image messages
pub const IMAGE_PREVIEW: &str = "📷 Image";

/// Avatar used on outgoing messages when the user has no photo
pub const DEFAULT_AVATAR_URL: &str = "https://i.pravatar.cc/300";

/// Image upload API base; the cloud name is appended
pub const UPLOAD_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Content type assumed for picked images
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
