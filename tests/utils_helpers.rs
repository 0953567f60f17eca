mod common;

use browser_pom::{BrowserError, Locator, TestConfig};
use common::{BASE_URL, hidden, setup, setup_with, visible};
use std::time::{Duration, Instant};

#[test]
fn test_clear_all_storage_order() {
    let (utils, driver) = setup();

    utils.clear_all_storage().unwrap();

    assert_eq!(driver.calls(), vec!["clear_cookies", "clear_local_storage", "clear_session_storage"]);
    assert_eq!(
        utils.command_log().lines(),
        vec![
            "Action: All cookies cleared",
            "Action: Local storage cleared",
            "Action: Session storage cleared",
            "Action: All storage cleared",
        ]
    );
}

#[test]
fn test_visit_page_resolves_against_base_url() {
    let (utils, driver) = setup();

    utils.visit_page("/login").unwrap();
    utils.visit_page("https://other.test/x").unwrap();

    assert_eq!(driver.calls(), vec!["visit http://localhost:3000/login", "visit https://other.test/x"]);
    assert!(utils.command_log().contains("Action: Visiting \"/login\""));
}

#[test]
fn test_type_text_is_logged() {
    let (utils, driver) = setup();
    driver.set_css("#name", vec![visible("input", "")]);

    utils.type_text("#name", "Jane").unwrap();

    assert_eq!(utils.command_log().lines(), vec!["Action: Typed \"Jane\" into element"]);
    assert_eq!(utils.get_element("#name").unwrap().value.as_deref(), Some("Jane"));
}

#[test]
fn test_type_password_is_not_logged() {
    let (utils, driver) = setup();
    driver.set_css("#password", vec![visible("input", "")]);

    utils.type_password("#password", "s3cr3t!").unwrap();

    assert_eq!(utils.command_log().lines(), vec!["Action: Typed password in the field"]);
    assert!(!utils.command_log().contains("s3cr3t!"));
    assert_eq!(utils.get_element("#password").unwrap().value.as_deref(), Some("s3cr3t!"));
}

#[test]
fn test_click_logs_before_and_after() {
    let (utils, driver) = setup();
    driver.set_elements(Locator::text("Save"), vec![visible("button", "Save")]);
    driver.set_test_id("sample", vec![visible("a", "Sample")]);
    driver.set_css("li", vec![visible("li", "one"), visible("li", "two")]);

    utils.click_button_by_text("Save").unwrap();
    utils.click_element_by_test_id("sample").unwrap();
    utils.click_first_element("li").unwrap();
    utils.click_last_element("li").unwrap();

    assert_eq!(
        utils.command_log().lines(),
        vec![
            "Action: Clicking element with the text \"Save\"",
            "Action: Clicked on \"Save\"",
            "Action: Clicking element with data-test-id \"sample\"",
            "Action: Clicked on element with data-test-id \"sample\"",
            "Action: Clicking first element with the locator \"li\"",
            "Action: Clicked on first element",
            "Action: Clicking last element with the locator \"li\"",
            "Action: Clicked on last element",
        ]
    );
    assert_eq!(driver.calls()[2], "click first of li");
    assert_eq!(driver.calls()[3], "click last of li");
}

#[test]
fn test_click_on_ambiguous_locator_fails() {
    let (utils, driver) = setup();
    driver.set_css("button", vec![visible("button", "A"), visible("button", "B")]);

    let err = utils.click_button_by_locator("button").unwrap_err();

    assert!(matches!(err, BrowserError::MultipleElements { count: 2, .. }));
    assert_eq!(utils.command_log().lines(), vec!["Action: Clicking element with the locator \"button\""]);
}

#[test]
fn test_visibility_of_missing_element_times_out() {
    let (utils, _driver) = setup();

    let started = Instant::now();
    let err = utils.element_is_visible("#missing", None).unwrap_err();

    assert!(started.elapsed() >= Duration::from_millis(200));
    match err {
        BrowserError::AssertionFailed { expected, actual, timeout_ms } => {
            assert_eq!(expected, "#missing to be visible");
            assert_eq!(actual, "found no elements");
            assert_eq!(timeout_ms, 200);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(utils.command_log().is_empty());
}

#[test]
fn test_visibility_waits_for_element() {
    let (utils, driver) = setup();
    let later = driver.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(60));
        later.set_css(".toast", vec![visible("div", "Saved")]);
    });

    utils.element_is_visible(".toast", Some("Toast")).unwrap();
    handle.join().unwrap();

    assert_eq!(utils.command_log().lines(), vec!["Assertion: \"Toast\" is visible"]);
}

#[test]
fn test_visibility_requires_every_element() {
    let (utils, driver) = setup();
    driver.set_css("li", vec![visible("li", "one"), hidden("li", "two")]);

    assert!(utils.element_is_visible("li", None).is_err());
    utils.first_element_is_visible("li", Some("List")).unwrap();
    assert!(utils.last_element_is_visible("li", None).unwrap_err().is_assertion());

    assert_eq!(utils.command_log().lines(), vec!["Assertion: First element of \"List\" is visible"]);
}

#[test]
fn test_each_element_is_visible() {
    let (utils, driver) = setup();
    driver.set_css("nav a", vec![visible("a", "Home"), visible("a", "About")]);

    utils.each_element_is_visible("nav a").unwrap();

    assert_eq!(
        utils.command_log().lines(),
        vec![
            "Assertion: Element containing \"Home\" is visible",
            "Assertion: Element containing \"About\" is visible",
        ]
    );
}

#[test]
fn test_visibility_by_test_id_and_text() {
    let (utils, driver) = setup();
    driver.set_test_id("banner", vec![visible("div", "Welcome")]);
    driver.set_elements(Locator::text("Welcome"), vec![visible("div", "Welcome")]);
    driver.set_elements(Locator::text("Goodbye"), vec![hidden("div", "Goodbye")]);

    utils.check_visibility_by_test_id("banner", None).unwrap();
    utils.check_visibility_by_test_id("banner", Some("Banner")).unwrap();
    utils.element_is_visible_by_text("Welcome").unwrap();
    utils.element_is_not_visible_by_text("Goodbye").unwrap();

    assert_eq!(
        utils.command_log().lines(),
        vec![
            "Assertion: Element with data-test-id \"banner\" is visible",
            "Assertion: \"Banner\" is visible",
            "Assertion: Element containing text \"Welcome\" is visible",
            "Assertion: Element containing text \"Goodbye\" is not visible",
        ]
    );
}

#[test]
fn test_existence_assertions() {
    let (utils, driver) = setup();
    driver.set_css("#hidden", vec![hidden("input", "")]);
    driver.set_css("#shown", vec![visible("input", "")]);

    utils.element_exists("#hidden", Some("Token field")).unwrap();
    utils.element_does_not_exist("#gone", None).unwrap();
    utils.element_is_not_visible("#hidden", None).unwrap();

    // Exists means present but not visible
    assert!(utils.element_exists("#shown", None).is_err());
    assert!(utils.element_does_not_exist("#shown", None).is_err());

    assert_eq!(
        utils.command_log().lines(),
        vec![
            "Assertion: \"Token field\" exists in DOM",
            "Assertion: Element does not exist in DOM",
            "Assertion: Element is not visible",
        ]
    );
}

#[test]
fn test_url_and_title_assertions() {
    let (utils, driver) = setup();
    driver.set_url("http://localhost:3000/sample/sample?tab=1");
    driver.set_title("Sample");

    utils.verify_partial_url("/sample/sample").unwrap();
    utils.verify_full_url("http://localhost:3000/sample/sample?tab=1").unwrap();
    utils.verify_full_url_with_base_url("/sample/sample?tab=1").unwrap();
    utils.verify_page_title("Sample").unwrap();
    assert!(utils.verify_partial_url("/other").unwrap_err().is_assertion());

    assert_eq!(
        utils.command_log().lines(),
        vec![
            "Assertion: Verified URL with partial path \"/sample/sample\"",
            "Assertion: Verified URL \"http://localhost:3000/sample/sample?tab=1\"",
            "Assertion: Verified URL \"http://localhost:3000/sample/sample?tab=1\"",
            "Assertion: Verified page title \"Sample\"",
        ]
    );
}

#[test]
fn test_full_url_with_empty_base_url() {
    let (utils, driver) = setup_with(TestConfig::default());
    driver.set_url("/dashboard");

    utils.verify_full_url_with_base_url("/dashboard").unwrap();
    assert!(utils.command_log().contains("Verified URL \"/dashboard\""));
}

#[test]
fn test_text_assertions() {
    let (utils, driver) = setup();
    driver.set_css("h1", vec![visible("h1", "Welcome back, Jane")]);
    driver.set_test_id("greeting", vec![visible("p", "Hello")]);

    utils.element_contains_text("h1", "back").unwrap();
    utils.verify_element_text("h1", "Welcome back, Jane").unwrap();
    utils.verify_text_by_test_id("greeting", "Hello").unwrap();

    let err = utils.verify_element_text("h1", "Welcome").unwrap_err();
    assert_eq!(err.to_string(), "Expected text of h1 to equal \"Welcome\", but it was \"Welcome back, Jane\"");

    assert!(utils.command_log().contains("Assertion: Element containing the text \"back\" verified"));
    assert!(utils.command_log().contains("Assertion: Element contains the expected text \"Welcome back, Jane\""));
    assert!(utils.command_log().contains("Assertion: Element with data-test-id \"greeting\" contains \"Hello\""));
}

#[test]
fn test_getters() {
    let (utils, driver) = setup();
    driver.set_css("li", vec![visible("li", "one"), visible("li", "two"), visible("li", "three")]);
    driver.set_test_id("total", vec![visible("span", "42")]);

    assert_eq!(utils.get_elements("li").unwrap().len(), 3);
    assert_eq!(utils.get_first_element("li").unwrap().text_content, "one");
    assert_eq!(utils.get_last_element("li").unwrap().text_content, "three");
    assert_eq!(utils.get_element_by_test_id("total").unwrap().text_content, "42");
    assert_eq!(utils.get_element_text("li").unwrap(), "onetwothree");
    assert!(matches!(utils.get_element("li").unwrap_err(), BrowserError::MultipleElements { count: 3, .. }));
}

#[test]
fn test_attribute_assertion() {
    let (utils, driver) = setup();
    driver.set_css("a.docs", vec![visible("a", "Docs").with_attribute("href", "/docs")]);

    utils.verify_attribute_value("a.docs", "href", "/docs").unwrap();
    assert!(utils.verify_attribute_value("a.docs", "target", "_blank").is_err());

    assert_eq!(utils.command_log().lines(), vec!["Assertion: Attribute \"href\" has value \"/docs\""]);
}

#[test]
fn test_select_dropdown_by_value() {
    let (utils, driver) = setup();
    driver.set_css("#country", vec![visible("select", "").with_value("")]);
    driver.set_options("#country", &[("United States", "US"), ("Germany", "DE")]);

    utils.select_dropdown_by_value("#country", "US").unwrap();

    assert_eq!(utils.get_element("#country").unwrap().value.as_deref(), Some("US"));
    assert_eq!(
        utils.command_log().lines(),
        vec![
            "Action: Selecting option with value \"US\"",
            "Assertion: \"US\" selected from the dropdown",
        ]
    );
}

#[test]
fn test_select_dropdown_by_text_checks_option_value() {
    let (utils, driver) = setup();
    driver.set_css("#country", vec![visible("select", "").with_value("")]);
    driver.set_options("#country", &[("United States", "US"), ("Germany", "DE")]);

    utils.select_dropdown_by_text("#country", "Germany").unwrap();

    assert_eq!(utils.get_element("#country").unwrap().value.as_deref(), Some("DE"));
    assert!(utils.command_log().contains("Assertion: \"Germany\" selected from the dropdown"));
}

#[test]
fn test_select_missing_option() {
    let (utils, driver) = setup();
    driver.set_css("#country", vec![visible("select", "")]);
    driver.set_options("#country", &[("Germany", "DE")]);

    let err = utils.select_dropdown_by_value("#country", "FR").unwrap_err();
    assert!(matches!(err, BrowserError::OptionNotFound { .. }));
}

#[test]
fn test_select_dropdown_by_test_id() {
    let (utils, driver) = setup();
    driver.set_test_id("role", vec![visible("select", "")]);
    driver.set_options_for(Locator::test_id("role"), &[("Administrator", "admin")]);

    utils.select_dropdown_by_test_id("role", "admin").unwrap();

    assert_eq!(utils.get_element_by_test_id("role").unwrap().value.as_deref(), Some("admin"));
    assert_eq!(
        utils.command_log().lines(),
        vec![
            "Action: Selecting option with value \"admin\" from dropdown with data-test-id \"role\"",
            "Assertion: \"admin\" selected from the dropdown",
        ]
    );
}

#[test]
fn test_wait_for_seconds() {
    let (utils, driver) = setup();

    let started = Instant::now();
    utils.wait_for_seconds(0.25).unwrap();

    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(driver.pauses(), vec![Duration::from_millis(250)]);
    assert!(utils.command_log().is_empty());
    assert!(driver.calls().is_empty());
}

#[test]
fn test_wait_for_negative_seconds() {
    let (utils, _driver) = setup();
    assert!(matches!(utils.wait_for_seconds(-1.0).unwrap_err(), BrowserError::Config(_)));
}

#[test]
fn test_uncaught_exceptions_policy() {
    let (utils, driver) = setup();
    driver.throw("ResizeObserver loop limit exceeded");
    assert!(matches!(utils.ensure_no_uncaught_exceptions().unwrap_err(), BrowserError::UncaughtException(_)));

    let mut config = common::config();
    config.uncaught_exceptions = browser_pom::ExceptionPolicy::ignoring(["ResizeObserver"]);
    let (utils, driver) = setup_with(config);
    driver.throw("ResizeObserver loop limit exceeded");
    utils.ensure_no_uncaught_exceptions().unwrap();

    driver.throw("TypeError: x is undefined");
    assert!(utils.ensure_no_uncaught_exceptions().is_err());

    let mut config = common::config();
    config.uncaught_exceptions = browser_pom::ExceptionPolicy::IgnoreAll;
    let (utils, driver) = setup_with(config);
    driver.throw("TypeError: x is undefined");
    utils.ensure_no_uncaught_exceptions().unwrap();
}

#[test]
fn test_base_url_constant() {
    let (utils, _driver) = setup();
    assert_eq!(utils.config().env.base_url, BASE_URL);
}
