//! Common test fixtures for explorer tests.
//!
//! The capabilities document mirrors the shape of the NASA GIBS EPSG:3857
//! endpoint: one unnamed root layer wrapping named layers, time extents in
//! 1.1.1 `Extent` elements and legends on the `default` style.

use wms_common::LayerId;
use wms_protocol::{parse_capabilities, Capabilities};

/// Base URL used by fake services.
pub const BASE_URL: &str = "https://gibs.example.test/wms/epsg3857/best/wms.cgi?SERVICE=WMS";

/// Layer ids declared in [`CAPABILITIES_XML`].
pub mod layers {
    pub const MODIS_TERRA_TRUE_COLOR: &str = "MODIS_Terra_CorrectedReflectance_TrueColor";
    pub const MODIS_AQUA_TRUE_COLOR: &str = "MODIS_Aqua_CorrectedReflectance_TrueColor";
    pub const AMSR2_SNOW: &str = "AMSR2_Snow_Water_Equivalent";
    pub const VIIRS_MONTHLY: &str = "VIIRS_SNPP_Monthly_Composite";
    pub const REFERENCE_FEATURES: &str = "Reference_Features";
    pub const BROKEN_TIME: &str = "Broken_TimeEncoding";
    pub const COASTLINES: &str = "Coastlines";
    pub const GRATICULE: &str = "Graticule";
}

pub const MODIS_TERRA_TITLE: &str = "Corrected Reflectance (True Color, MODIS, Terra)";
pub const AMSR2_LEGEND: &str = "https://gibs.example.test/legends/AMSR2_Snow_Water_Equivalent_H.png";

pub const CAPABILITIES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMT_MS_Capabilities version="1.1.1" xmlns:xlink="http://www.w3.org/1999/xlink">
  <Service>
    <Name>OGC:WMS</Name>
    <Title>NASA Global Imagery Browse Services for EOSDIS</Title>
  </Service>
  <Capability>
    <Layer>
      <Title>NASA Global Imagery Browse Services</Title>
      <SRS>EPSG:3857</SRS>
      <Layer queryable="0">
        <Name>MODIS_Terra_CorrectedReflectance_TrueColor</Name>
        <Title>Corrected Reflectance (True Color, MODIS, Terra)</Title>
        <Dimension name="time" units="ISO8601"/>
        <Extent name="time" default="2020-01-03" nearestValue="0">2020-01-01T00:00:00Z/2020-01-03T00:00:00Z/P1D</Extent>
      </Layer>
      <Layer queryable="0">
        <Name>MODIS_Aqua_CorrectedReflectance_TrueColor</Name>
        <Title>Corrected Reflectance (True Color, MODIS, Aqua)</Title>
        <Extent name="time">2020-02-01/2020-02-02/P1D</Extent>
      </Layer>
      <Layer queryable="0">
        <Name>AMSR2_Snow_Water_Equivalent</Name>
        <Title>Snow Water Equivalent (AMSR2, GCOM-W1)</Title>
        <Extent name="time">2015-01-01/2015-01-02/P1D,2015-01-02/2015-01-03/P1D</Extent>
        <Style>
          <Name>default</Name>
          <Title>default</Title>
          <LegendURL width="378" height="86">
            <Format>image/png</Format>
            <OnlineResource xlink:type="simple" xlink:href="https://gibs.example.test/legends/AMSR2_Snow_Water_Equivalent_H.png"/>
          </LegendURL>
        </Style>
      </Layer>
      <Layer queryable="0">
        <Name>VIIRS_SNPP_Monthly_Composite</Name>
        <Title>Monthly Composite (VIIRS, SNPP)</Title>
        <Extent name="time">2021-01-01/2021-04-01/P1M</Extent>
      </Layer>
      <Layer queryable="0">
        <Name>Reference_Features</Name>
        <Title>Place Labels and Borders</Title>
      </Layer>
      <Layer queryable="0">
        <Name>Broken_TimeEncoding</Name>
        <Title>Layer with a truncated time extent</Title>
        <Extent name="time">2020-01-01/2020-01-02</Extent>
      </Layer>
      <Layer queryable="0">
        <Name>Coastlines</Name>
        <Title>Coastlines</Title>
      </Layer>
      <Layer queryable="0">
        <Name>Graticule</Name>
        <Title>Graticule</Title>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

/// Parsed [`CAPABILITIES_XML`].
pub fn capabilities() -> Capabilities {
    parse_capabilities(CAPABILITIES_XML).expect("fixture capabilities parse")
}

pub fn layer_id(name: &str) -> LayerId {
    LayerId::new(name)
}
