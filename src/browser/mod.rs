pub mod cdp_driver;
pub mod connection;
pub mod region_selector;

pub use cdp_driver::CdpInputDriver;
pub use connection::connect_to_browser_and_page;
pub use region_selector::BrowserRegionSelector;
