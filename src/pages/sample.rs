use crate::driver::Driver;
use crate::error::Result;
use crate::utils::Utils;

const SAMPLE_TEST_ID: &str = "sample";
const SAMPLE_PATH: &str = "/sample/sample";

/// The sample page
pub struct SamplePage<'a, D: Driver> {
    utils: &'a Utils<D>,
}

impl<'a, D: Driver> SamplePage<'a, D> {
    pub fn new(utils: &'a Utils<D>) -> Self {
        Self { utils }
    }

    /// Click the `sample` element
    pub fn click(&self) -> Result<()> {
        self.utils.click_element_by_test_id(SAMPLE_TEST_ID)
    }

    pub fn verify_url(&self) -> Result<()> {
        self.utils.verify_partial_url(SAMPLE_PATH)
    }
}
