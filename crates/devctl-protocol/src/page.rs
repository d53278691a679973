//! HTML control page.
//!
//! The page is rendered fresh on every request. Slider and message fields
//! always start at their defaults; only the sensor line reflects the device.
//! Its script calls back into the same endpoint for color, hue, message and
//! snapshot requests.

use devctl_core::SensorReading;

/// Shown in place of a value the sensor did not return.
pub const UNAVAILABLE: &str = "N/A";

/// Render the control page with the given reading.
pub fn render(reading: &SensorReading) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>ESP32 Control</title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ margin: 0; font-family: sans-serif; background: #5563de; display: flex; justify-content: center; align-items: center; min-height: 100vh; }}
        .panel {{ background: #fff; border-radius: 12px; padding: 24px; max-width: 400px; width: 90%; }}
        h1, h2 {{ color: #5563de; }}
        input[type="range"] {{ width: 70%; }}
        input[type="number"] {{ width: 20%; text-align: center; }}
        input[type="text"] {{ width: 100%; padding: 8px; box-sizing: border-box; }}
        button {{ width: 100%; padding: 10px; margin-top: 10px; border: none; border-radius: 5px; background: #5563de; color: #fff; cursor: pointer; }}
        #alert {{ font-style: italic; }}
    </style>
</head>
<body>
    <div class="panel">
        <h1>RGB LED Control</h1>
        <p id="reading">Temperature: {temperature}&deg;C | Humidity: {humidity}%</p>
        <p id="alert"></p>

        <label>Red:</label>
        <input type="range" id="red" min="0" max="255" value="0" oninput="mirror('red')">
        <input type="number" id="redValue" min="0" max="255" value="0" oninput="sync('red')"><br>

        <label>Green:</label>
        <input type="range" id="green" min="0" max="255" value="0" oninput="mirror('green')">
        <input type="number" id="greenValue" min="0" max="255" value="0" oninput="sync('green')"><br>

        <label>Blue:</label>
        <input type="range" id="blue" min="0" max="255" value="0" oninput="mirror('blue')">
        <input type="number" id="blueValue" min="0" max="255" value="0" oninput="sync('blue')"><br>

        <button onclick="setColor()">Set Color</button>

        <label>Hue:</label>
        <input type="range" id="hue" min="0" max="255" value="0" onchange="setHue()"><br>

        <h2>OLED Message</h2>
        <input type="text" id="msg" placeholder="Enter message (max 64 chars)" maxlength="64">
        <button onclick="sendMessage()">Send to OLED</button>
    </div>

    <script>
        function mirror(color) {{
            document.getElementById(color + "Value").value = document.getElementById(color).value;
        }}

        function sync(color) {{
            let value = Math.min(255, Math.max(0, document.getElementById(color + "Value").value));
            document.getElementById(color + "Value").value = value;
            document.getElementById(color).value = value;
        }}

        function setColor() {{
            let r = document.getElementById("red").value;
            let g = document.getElementById("green").value;
            let b = document.getElementById("blue").value;
            fetch("/?r=" + r + "&g=" + g + "&b=" + b);
        }}

        function setHue() {{
            let h = document.getElementById("hue").value;
            fetch("/?hue=" + h);
        }}

        function sendMessage() {{
            let msg = document.getElementById("msg").value;
            fetch("/?msg=" + encodeURIComponent(msg));
        }}

        function refresh() {{
            fetch("/data")
                .then(response => response.json())
                .then(data => {{
                    let t = data.temperature === null ? "{unavailable}" : data.temperature;
                    let h = data.humidity === null ? "{unavailable}" : data.humidity;
                    document.getElementById("reading").innerHTML =
                        "Temperature: " + t + "&deg;C | Humidity: " + h + "%";
                    document.getElementById("alert").textContent = data.alert;
                }})
                .catch(() => {{}});
        }}

        setInterval(refresh, 5000);
    </script>
</body>
</html>"#,
        temperature = display_value(reading.temperature),
        humidity = display_value(reading.humidity),
        unavailable = UNAVAILABLE,
    )
}

fn display_value(value: Option<f32>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}
