pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 10;
pub const PROFILE_COUNT_PER_PAGE: i64 = 10;

pub const STRING_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;

pub const MIN_AMOUNT_VALUE: i32 = 1;
pub const MIN_COOKING_TIME: i32 = 1;

/* "me" collides with the /users/me route */
pub const RESERVED_USERNAMES: &[&str] = &["me"];
pub const USERNAME_EXTRA_CHARS: &[char] = &['.', '@', '+', '-'];

pub const SHOPPING_LIST_HEADER: &str = "Список покупок: ";
pub const SHOPPING_LIST_FILENAME: &str = "shopping-list.txt";

pub const MEDIA_IMAGE_DIR: &str = "recipes/images";

pub const SESSION_COOKIE: &str = "session";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
