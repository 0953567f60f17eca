use crate::dom::test_id_selector;
use crate::driver::Driver;
use crate::error::Result;
use crate::utils::Utils;

const LOGIN_PATH: &str = "/login";
const USERNAME_TEST_ID: &str = "username";
const PASSWORD_TEST_ID: &str = "password";
const SUBMIT_TEST_ID: &str = "login-submit";

/// Login form, driven with the credentials from the configured env bag
pub struct LoginPage<'a, D: Driver> {
    utils: &'a Utils<D>,
}

impl<'a, D: Driver> LoginPage<'a, D> {
    pub fn new(utils: &'a Utils<D>) -> Self {
        Self { utils }
    }

    pub fn open(&self) -> Result<()> {
        self.utils.visit_page(LOGIN_PATH)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<()> {
        self.utils.type_text(&test_id_selector(USERNAME_TEST_ID), username)?;
        self.utils.type_password(&test_id_selector(PASSWORD_TEST_ID), password)?;
        self.utils.click_element_by_test_id(SUBMIT_TEST_ID)
    }

    /// Log in with `env.admin_user` / `env.admin_pass`
    pub fn login_as_admin(&self) -> Result<()> {
        let env = &self.utils.config().env;
        self.login(&env.admin_user, &env.admin_pass)
    }

    /// The browser landed on `path` after logging in
    pub fn verify_logged_in(&self, path: &str) -> Result<()> {
        self.utils.verify_partial_url(path)
    }
}
